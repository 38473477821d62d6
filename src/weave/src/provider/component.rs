use std::collections::HashSet;
use std::error::Error as StdError;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::marker::PhantomData;

use crate::context::{Context, TypedInjector};
use crate::error::Error;
use crate::managed::Managed;
use crate::provider::TypedProvider;
use crate::reference::Dependency;

/// The field-injection half of a component, generated alongside [`Component`]
/// when a struct carries its own `#[component]` attribute (on the struct
/// itself, as opposed to the `impl` block that carries the constructor).
///
/// Every type gets the no-op default through the blanket impl below; a
/// struct with `#[inject]`-annotated `Option<T>` fields gets an inherent
/// `inject_own_fields`/`own_field_dependencies` pair from the macro instead,
/// which Rust's method resolution prefers over the blanket trait default
/// without either side needing to know about the other.
pub trait ComponentFields: Sized {
    #[allow(unused_variables)]
    fn inject_own_fields<I>(&mut self, injector: &I) -> Result<(), Error>
    where
        I: TypedInjector + ?Sized,
    {
        Ok(())
    }

    fn own_field_dependencies() -> Vec<Dependency>
    where
        Self: Sized,
    {
        Vec::new()
    }
}

impl<T> ComponentFields for T {}

/// A type with a dedicated constructor, field set and method set for
/// dependency injection.
///
/// You don't usually implement this by hand: `#[component]` generates it
/// from an `impl` block whose single `#[inject]`-annotated associated
/// function is the constructor, and whose `#[inject]`-annotated fields and
/// methods are the injection sites run afterwards. See the crate-level
/// documentation for a worked example.
///
/// ```rust
/// # use std::convert::Infallible;
/// # use weave::context::TypedInjector;
/// # use weave::error::Error;
/// # use weave::key;
/// # use weave::provider::component::Component;
/// #
/// #[derive(Clone)]
/// struct Greeter {
///     name: &'static str,
/// }
///
/// impl Component for Greeter {
///     type Constructed = Self;
///     type Error = Infallible;
///
///     fn construct<I>(injector: &I) -> Result<Result<Self, Self::Error>, Error>
///     where
///         I: TypedInjector + ?Sized,
///     {
///         let name = injector.get(key::named("app_name"))?.unwrap_or("world");
///         Ok(Ok(Self { name }))
///     }
///
///     fn post_process(self) -> Self::Constructed {
///         self
///     }
///
///     fn dependencies() -> Vec<weave::reference::Dependency> {
///         vec![]
///     }
/// }
/// ```
pub trait Component: Managed + Sized {
    /// The value handed to callers: usually `Self`, sometimes a wrapper such
    /// as `Rc<dyn Trait>` when the component is bound behind a trait object.
    /// `Clone` is required so a scope can memoize and hand out copies of it.
    type Constructed: Managed + Clone;

    /// The error a fallible constructor body can return.
    type Error: Into<Box<dyn StdError>>;

    /// Resolves constructor-parameter dependencies and builds `Self`.
    ///
    /// The outer `Result` reports missing dependencies (never actually
    /// triggered post-validation; kept so this trait composes with
    /// hand-written implementations that skip validation). The inner
    /// `Result` is the constructor's own fallible outcome.
    fn construct<I>(injector: &I) -> Result<Result<Self, Self::Error>, Error>
    where
        I: TypedInjector + ?Sized;

    /// Populates `#[inject]`-annotated `Option<T>` fields after
    /// construction. Default: no fields to inject.
    #[allow(unused_variables)]
    fn inject_fields<I>(&mut self, injector: &I) -> Result<(), Error>
    where
        I: TypedInjector + ?Sized,
    {
        Ok(())
    }

    /// Runs `#[inject]`-annotated methods, base-first, after fields are
    /// populated. Default: no methods to inject.
    #[allow(unused_variables)]
    fn inject_methods<I>(&mut self, injector: &I) -> Result<(), Error>
    where
        I: TypedInjector + ?Sized,
    {
        Ok(())
    }

    /// Converts the fully injected `Self` into [`Component::Constructed`].
    fn post_process(self) -> Self::Constructed;

    /// The flattened list of every dependency this component's constructor,
    /// fields and methods declare, used by the validator before any
    /// instance is built.
    fn dependencies() -> Vec<Dependency>
    where
        Self: Sized;

    /// The name of the scope annotation given to `#[component(scope = ...)]`,
    /// if any. Conflicts with an explicit `.scoped(...)` at bind time.
    fn scope_name() -> Option<&'static str> {
        None
    }
}

/// The override-aware half of method injection, generated alongside
/// [`Component`] for every `#[component]`-annotated type so that a type
/// using `#[component(extends = Base)]` can recurse into `Base`'s own
/// injectable methods.
///
/// `skip` holds method names the leaf type silently took over (redeclared
/// without re-annotating `#[inject]`) — these never run, at any level.
/// `claimed` accumulates, as the recursion descends from the leaf towards
/// the root, the names every more-derived level redeclared *with*
/// `#[inject]` — an ancestor whose own candidate name appears in `claimed`
/// defers to the override and does not run its own version.
pub trait ComponentMethods: Component {
    /// This type's own `#[inject]`-annotated method names, not including
    /// any inherited via `extends`.
    fn own_inject_method_names() -> HashSet<&'static str>
    where
        Self: Sized,
    {
        HashSet::new()
    }

    /// This type's own names, unioned with every ancestor's, transitively.
    /// Only overridden when `extends` is present.
    fn all_inject_method_names() -> HashSet<&'static str>
    where
        Self: Sized,
    {
        Self::own_inject_method_names()
    }

    /// Runs this level's own injectable methods (honoring `skip` and
    /// `claimed`), after first recursing into its own ancestor, if any.
    #[allow(unused_variables)]
    fn run_as_ancestor<I>(
        &mut self,
        injector: &I,
        skip: &HashSet<&'static str>,
        claimed: &mut HashSet<&'static str>,
    ) -> Result<(), Error>
    where
        I: TypedInjector + ?Sized,
    {
        Ok(())
    }
}

/// A [`TypedProvider`] that produces a [`Component`] by running the full
/// construct / inject-fields / inject-methods / post-process sequence.
pub struct ComponentProvider<C>
where
    C: Component,
{
    _marker: PhantomData<C>,
}

impl<C> ComponentProvider<C>
where
    C: Component,
{
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<C> Default for ComponentProvider<C>
where
    C: Component,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Debug for ComponentProvider<C>
where
    C: Component,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ComponentProvider<C>").finish_non_exhaustive()
    }
}

impl<C> TypedProvider for ComponentProvider<C>
where
    C: Component,
{
    type Output = C::Constructed;

    fn produce(&self, ctx: &Context) -> Result<Self::Output, Error> {
        match C::construct(ctx) {
            Ok(Ok(mut obj)) => {
                obj.inject_fields(ctx)?;
                obj.inject_methods(ctx)?;
                Ok(obj.post_process())
            }
            Ok(Err(err)) => Err(Error::Construction {
                component: Box::new(crate::key::of::<C>()),
                source: err.into(),
            }),
            Err(err) => Err(err),
        }
    }

    fn dependencies(&self) -> Vec<Dependency> {
        C::dependencies()
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::rc::Rc;

    use crate::key;

    use super::*;

    pub trait Abstract: 'static {}

    pub struct Impl;

    impl Abstract for Impl {}

    impl Component for Impl {
        type Constructed = Rc<dyn Abstract>;
        type Error = Infallible;

        fn construct<I>(_injector: &I) -> Result<Result<Self, Self::Error>, Error>
        where
            I: TypedInjector + ?Sized,
        {
            Ok(Ok(Impl))
        }

        fn post_process(self) -> Self::Constructed {
            Rc::new(self)
        }

        fn dependencies() -> Vec<Dependency> {
            vec![]
        }
    }

    #[test]
    fn component_provider_constructs_and_post_processes() {
        let mut config = crate::config::Config::new();
        config.bind::<Rc<dyn Abstract>>().to_component::<Impl>();
        let ctx = config.resolve().unwrap();

        assert!(ctx.get(key::of::<Rc<dyn Abstract>>()).unwrap().is_some());
    }

    #[test]
    fn construct_resolves_its_dependency_through_a_mock_injector() {
        use crate::context::MockInjector;

        struct Greeting {
            value: i32,
        }

        impl Component for Greeting {
            type Constructed = Self;
            type Error = Infallible;

            fn construct<I>(injector: &I) -> Result<Result<Self, Self::Error>, Error>
            where
                I: TypedInjector + ?Sized,
            {
                let value = injector
                    .get(key::of())?
                    .unwrap_or_else(|| unreachable!("the mock always answers this key"));
                Ok(Ok(Self { value }))
            }

            fn post_process(self) -> Self::Constructed {
                self
            }

            fn dependencies() -> Vec<Dependency> {
                vec![Dependency::direct(Box::new(key::of::<i32>()))]
            }
        }

        let mut injector = MockInjector::new();
        injector
            .expect_dyn_get()
            .returning(|_key| Ok(Box::new(42i32)));

        let greeting = Greeting::construct(&injector).unwrap().unwrap();
        assert_eq!(greeting.value, 42);
    }
}
