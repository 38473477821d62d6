use std::error::Error as StdError;

use snafu::Snafu;

use crate::key::Key;

/// Everything that can go wrong while binding, validating or resolving a
/// [`Config`](crate::config::Config).
///
/// `IllegalComponent`, `DependencyNotFound` and `CyclicDependenciesFound` are
/// diagnosable: a caller can `match` on them and assert on their structured
/// payload in tests. `Construction` is the one opaque variant, carrying
/// whatever a user's own fallible constructor returned.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// A component, a binding or an injection site is structurally
    /// ill-formed: a constructor with zero or several `#[inject]`
    /// candidates, an injectable field that isn't `Option<T>`, a generic
    /// injectable method, more than one qualifier on a single site, more
    /// than one scope on a single binding, or a scope that isn't registered
    /// for the annotation used.
    #[snafu(display("illegal component{}: {reason}", component.map(|c| format!(" `{c}`")).unwrap_or_default()))]
    IllegalComponent {
        component: Option<&'static str>,
        reason: IllegalComponentReason,
    },

    /// A binding declares a dependency that no binding in the same `Config`
    /// satisfies. Raised eagerly by the validator, before any instance is
    /// constructed.
    #[snafu(display("`{component}` depends on `{dependency}`, which is not bound"))]
    DependencyNotFound {
        component: Box<dyn Key>,
        dependency: Box<dyn Key>,
    },

    /// The direct (non-`Lazy`) dependency graph contains a cycle. The path
    /// lists the keys encountered while walking back to the node where the
    /// cycle closes.
    #[snafu(display("cyclic dependency detected: {}", join_keys(components)))]
    CyclicDependenciesFound { components: Vec<Box<dyn Key>> },

    /// A user-supplied constructor body returned `Err`.
    #[snafu(display("failed to construct `{component}`"))]
    Construction {
        component: Box<dyn Key>,
        source: Box<dyn StdError>,
    },
}

fn join_keys(keys: &[Box<dyn Key>]) -> String {
    keys.iter()
        .map(|key| key.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// The specific structural defect behind an [`Error::IllegalComponent`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IllegalComponentReason {
    /// No associated function in the `impl` block is annotated `#[inject]`.
    NoConstructor,
    /// More than one associated function is annotated `#[inject]`.
    AmbiguousConstructor,
    /// A type marked `#[component(abstract)]` was bound as if it were a
    /// concrete implementation.
    AbstractComponent,
    /// An injectable field is not declared `Option<T>`.
    NonOptionField { field: &'static str },
    /// An injectable method carries its own generic type parameters.
    GenericInjectMethod { method: &'static str },
    /// More than one of `#[named]` / `#[qualified]` was applied to a single
    /// injection site.
    AmbiguousQualifier,
    /// A binding received both a type-level and a bind-time scope.
    ConflictingScope,
    /// A binding named a scope this `Config` has no factory registered for.
    UnknownScope { scope: &'static str },
}

impl std::fmt::Display for IllegalComponentReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoConstructor => write!(f, "no associated function is annotated with `#[inject]`"),
            Self::AmbiguousConstructor => {
                write!(f, "more than one associated function is annotated with `#[inject]`")
            }
            Self::AbstractComponent => write!(f, "abstract component bound as an implementation"),
            Self::NonOptionField { field } => {
                write!(f, "injectable field `{field}` is not declared `Option<T>`")
            }
            Self::GenericInjectMethod { method } => {
                write!(f, "injectable method `{method}` has its own generic parameters")
            }
            Self::AmbiguousQualifier => write!(f, "more than one qualifier annotation on a single site"),
            Self::ConflictingScope => write!(f, "both a type-level and a bind-time scope were given"),
            Self::UnknownScope { scope } => write!(f, "no factory is registered for scope `{scope}`"),
        }
    }
}
