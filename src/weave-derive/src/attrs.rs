use proc_macro::TokenStream;
use syn::parse::{Parse, ParseStream};
use syn::{Error as SynError, Ident, LitStr, Path, Result as SynResult, Token, Type, TypePath};

/// The parsed contents of `#[component(...)]`.
///
/// `output_type` / `post_processor` are the positional pair (`Rc<dyn Trait>,
/// Rc::new`); `scope` and `extends` are named arguments (`scope = "..."`,
/// `extends = Base`); `fields` and `abstract` are bare flags. Any, none or
/// all of these may be present, in any order, on the `impl`-block
/// invocation. `abstract` is only meaningful on the struct invocation (see
/// [`crate::fields`]) and `fields` only on the `impl`-block invocation.
#[derive(Debug, Default)]
pub struct AttributeData {
    pub output_type: Option<Type>,
    pub post_processor: Option<Path>,
    pub scope: Option<String>,
    /// `extends = Base`: `Base` is composed into this component as a field
    /// literally named `base`, standing in for the hierarchy walk the
    /// source language's reflection would otherwise do. See
    /// `ComponentMethods` for the override-aware invocation this drives.
    pub extends: Option<Path>,
    /// Whether the struct this `impl` block constructs also carries its own
    /// `#[component]` invocation declaring injectable fields.
    pub fields: bool,
    /// `#[component(abstract)]`: only valid on a struct/enum item with no
    /// constructor; marks a type that must never be bound as a concrete
    /// implementation.
    pub is_abstract: bool,
}

pub fn parse_attributes(attr: TokenStream) -> SynResult<AttributeData> {
    if attr.is_empty() {
        return Ok(AttributeData::default());
    }

    let parsed: ComponentArgs = syn::parse(attr)?;

    let (output_type, post_processor) = match parsed.positional.len() {
        0 => (None, None),
        2 => {
            let post_processor = match &parsed.positional[1] {
                Type::Path(TypePath { path, qself: None }) => path.clone(),
                other => {
                    return Err(SynError::new_spanned(other, "expects a function path as the post-processor"));
                }
            };
            (Some(parsed.positional[0].clone()), Some(post_processor))
        }
        _ => {
            return Err(SynError::new(
                proc_macro2::Span::call_site(),
                "expects either no positional arguments, or exactly an output type and a post-processor function",
            ));
        }
    };

    Ok(AttributeData {
        output_type,
        post_processor,
        scope: parsed.scope.map(|lit| lit.value()),
        extends: parsed.extends,
        fields: parsed.fields,
        is_abstract: parsed.is_abstract,
    })
}

/// Whether the next token is a bare identifier that stands alone as an
/// argument (followed by `,` or end-of-input), as opposed to the leading
/// segment of a type such as `Rc<dyn Trait>` or `Rc::new`. Only a standalone
/// identifier can be the `fields` flag; anything else falls through to
/// `Type` parsing, which a bare identifier is also a valid (if degenerate)
/// parse of, so the two can't be told apart by `peek(Ident)` alone.
fn peeks_standalone_ident(input: ParseStream) -> bool {
    let fork = input.fork();
    if fork.parse::<Ident>().is_err() {
        return false;
    }
    fork.is_empty() || fork.peek(Token![,])
}

struct ComponentArgs {
    positional: Vec<Type>,
    scope: Option<LitStr>,
    extends: Option<Path>,
    fields: bool,
    is_abstract: bool,
}

impl Parse for ComponentArgs {
    fn parse(input: ParseStream) -> SynResult<Self> {
        let mut positional = Vec::new();
        let mut scope = None;
        let mut extends = None;
        let mut fields = false;
        let mut is_abstract = false;

        while !input.is_empty() {
            if input.peek(Ident) && input.peek2(Token![=]) {
                let name: Ident = input.parse()?;
                input.parse::<Token![=]>()?;

                if name == "scope" {
                    if scope.is_some() {
                        return Err(SynError::new_spanned(&name, "`scope` given more than once"));
                    }
                    scope = Some(input.parse::<LitStr>()?);
                } else if name == "extends" {
                    if extends.is_some() {
                        return Err(SynError::new_spanned(&name, "`extends` given more than once"));
                    }
                    extends = Some(input.parse::<Path>()?);
                } else {
                    return Err(SynError::new_spanned(&name, format!("unknown `#[component]` argument `{name}`")));
                }
            } else if input.peek(Token![abstract]) {
                input.parse::<Token![abstract]>()?;
                is_abstract = true;
            } else if peeks_standalone_ident(input) {
                let name: Ident = input.parse()?;
                if name == "fields" {
                    fields = true;
                } else {
                    return Err(SynError::new_spanned(&name, format!("unknown `#[component]` argument `{name}`")));
                }
            } else {
                positional.push(input.parse::<Type>()?);
            }

            if input.is_empty() {
                break;
            }
            input.parse::<Token![,]>()?;
        }

        Ok(Self {
            positional,
            scope,
            extends,
            fields,
            is_abstract,
        })
    }
}
