//! Expansion for `#[component]` applied to a struct (or enum) item rather
//! than an `impl` block: field injection and the `abstract` marker.
//!
//! A proc-macro attribute only ever sees the single item it decorates, so
//! there is no way for the `impl`-block invocation (see [`crate::impls`]) to
//! inspect a struct's field list directly. Splitting `#[component]` across
//! two invocations — one on the struct, one on the `impl` block — sidesteps
//! that: the struct invocation generates an *inherent* `inject_own_fields` /
//! `own_field_dependencies` pair, which Rust's method resolution prefers
//! over `ComponentFields`'s blanket trait default (inherent methods are
//! always tried first), so the `impl`-block invocation can call
//! `self.inject_own_fields(...)` unconditionally and get the right behavior
//! whether or not the struct opted in.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::visit_mut::{self, VisitMut};
use syn::{
    AngleBracketedGenericArguments, Attribute, Error as SynError, Field, Fields, GenericArgument,
    Item, ItemEnum, ItemImpl, ItemStruct, Meta, PathArguments, Result as SynResult, Type, TypePath,
};

use crate::attrs::AttributeData;

struct FieldArgument {
    field_ident: syn::Ident,
    target_type: Type,
    indirection: FieldIndirection,
    qualifier: FieldQualifier,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum FieldIndirection {
    Direct,
    Lazy,
}

enum FieldQualifier {
    None,
    Named(TokenStream2),
    Qualified(TokenStream2),
}

/// `#[component(abstract)]` on a struct/enum: no constructor, no fields, no
/// `Component` impl at all. The type is left otherwise untouched; binding it
/// with `.to_component::<T>()` fails to compile for lack of a `Component`
/// impl, which is this crate's translation of "abstract bound as
/// implementation" (see `Error::IllegalComponent`'s `AbstractComponent`
/// reason for the parity note).
pub fn expand_abstract(item: TokenStream) -> SynResult<TokenStream2> {
    let item: Item = syn::parse(item)?;
    Ok(quote! { #item })
}

pub fn expand_fields(item: TokenStream, attr_data: AttributeData) -> SynResult<TokenStream2> {
    if attr_data.is_abstract {
        return expand_abstract(item);
    }

    let mut item: Item = syn::parse(item)?;

    let (self_type, fields) = match &mut item {
        Item::Struct(ItemStruct { ident, fields, .. }) => (ident.clone(), fields_mut(fields)?),
        Item::Enum(ItemEnum { ident, .. }) => (ident.clone(), Vec::new()),
        other => {
            return Err(SynError::new_spanned(
                other,
                "`#[component]` on a non-`impl` item expects a `struct` or `enum`",
            ));
        }
    };

    let arguments = fields
        .iter()
        .filter(|field| has_inject_attr(&field.attrs))
        .map(parse_field)
        .collect::<SynResult<Vec<_>>>()?;

    let assignments: TokenStream2 = arguments
        .iter()
        .map(|arg| {
            let field = &arg.field_ident;
            let key = key_expr(arg);
            match arg.indirection {
                FieldIndirection::Direct => quote! { self.#field = injector.get(#key)?; },
                FieldIndirection::Lazy => quote! { self.#field = injector.get_lazy(#key); },
            }
        })
        .collect();

    let dependency_entries: TokenStream2 = arguments
        .iter()
        .map(|arg| {
            let key = typed_key_expr(arg);
            match arg.indirection {
                FieldIndirection::Direct => quote! { weave::reference::Dependency::direct(std::boxed::Box::new(#key)), },
                FieldIndirection::Lazy => quote! { weave::reference::Dependency::lazy(std::boxed::Box::new(#key)), },
            }
        })
        .collect();

    let mut visitor = FieldAttributeRemovalVisitor;
    visitor.visit_item_mut(&mut item);

    Ok(quote! {
        #item

        impl #self_type {
            #[allow(clippy::needless_update)]
            fn inject_own_fields<I>(&mut self, injector: &I) -> std::result::Result<(), weave::error::Error>
            where
                I: weave::context::TypedInjector + ?Sized,
            {
                #assignments
                Ok(())
            }

            fn own_field_dependencies() -> std::vec::Vec<weave::reference::Dependency> {
                std::vec![#dependency_entries]
            }
        }
    })
}

fn fields_mut(fields: &mut Fields) -> SynResult<Vec<Field>> {
    match fields {
        Fields::Named(named) => Ok(named.named.iter().cloned().collect()),
        Fields::Unit => Ok(Vec::new()),
        Fields::Unnamed(unnamed) => Err(SynError::new_spanned(
            unnamed,
            "`#[inject]` fields require a named-field struct",
        )),
    }
}

fn has_inject_attr(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| matches!(&attr.meta, Meta::Path(path) if path.is_ident("inject")))
}

fn parse_field(field: &Field) -> SynResult<FieldArgument> {
    let field_ident = field
        .ident
        .clone()
        .ok_or_else(|| SynError::new_spanned(field, "`#[inject]` fields require a named-field struct"))?;

    let option_inner = unwrap_option(&field.ty).ok_or_else(|| {
        SynError::new_spanned(
            &field.ty,
            "an injectable field must be declared `Option<T>`: it is populated after construction, \
             so a plain field marked `#[inject]` could never observe the assignment",
        )
    })?;

    let (target_type, indirection) = unwrap_lazy(option_inner);

    let qualifier = parse_field_qualifier(&field.attrs)?;

    Ok(FieldArgument {
        field_ident,
        target_type,
        indirection,
        qualifier,
    })
}

/// `Lazy<T>` is recognized by its final path segment, so both a bare `Lazy`
/// brought into scope and a fully qualified `weave::reference::Lazy` match.
/// Mirrors `crate::impls::unwrap_lazy`; kept as its own copy since the two
/// modules parse unrelated syntax positions (a field type vs. a parameter
/// type) and have no shared entry point to hang a common helper off of.
fn unwrap_lazy(ty: Type) -> (Type, FieldIndirection) {
    if let Type::Path(TypePath { path, qself: None }) = &ty {
        if let Some(segment) = path.segments.last() {
            if segment.ident == "Lazy" {
                if let PathArguments::AngleBracketed(AngleBracketedGenericArguments { args, .. }) = &segment.arguments {
                    if args.len() == 1 {
                        if let Some(GenericArgument::Type(inner)) = args.first() {
                            return (inner.clone(), FieldIndirection::Lazy);
                        }
                    }
                }
            }
        }
    }
    (ty, FieldIndirection::Direct)
}

fn unwrap_option(ty: &Type) -> Option<Type> {
    let Type::Path(TypePath { path, qself: None }) = ty else {
        return None;
    };
    let segment = path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(AngleBracketedGenericArguments { args, .. }) = &segment.arguments else {
        return None;
    };
    if args.len() != 1 {
        return None;
    }
    match args.first()? {
        GenericArgument::Type(inner) => Some(inner.clone()),
        _ => None,
    }
}

fn parse_field_qualifier(attrs: &[Attribute]) -> SynResult<FieldQualifier> {
    let mut res = None;

    for attr in attrs {
        let Meta::List(list) = &attr.meta else { continue };
        let Some(name) = list.path.segments.last() else { continue };

        let data = if name.ident == "named" {
            FieldQualifier::Named(list.tokens.clone())
        } else if name.ident == "qualified" {
            FieldQualifier::Qualified(list.tokens.clone())
        } else {
            continue;
        };

        if res.is_some() {
            return Err(SynError::new_spanned(
                list,
                "only one of `#[named(...)]` or `#[qualified(...)]` is allowed on a single field",
            ));
        }
        res = Some(data);
    }

    Ok(res.unwrap_or(FieldQualifier::None))
}

fn key_expr(arg: &FieldArgument) -> TokenStream2 {
    match &arg.qualifier {
        FieldQualifier::None => quote! { weave::key::of() },
        FieldQualifier::Named(name) => quote! { weave::key::named(#name) },
        FieldQualifier::Qualified(qualifier) => quote! { weave::key::qualified(#qualifier) },
    }
}

fn typed_key_expr(arg: &FieldArgument) -> TokenStream2 {
    let ty = &arg.target_type;
    match &arg.qualifier {
        FieldQualifier::None => quote! { weave::key::of::<#ty>() },
        FieldQualifier::Named(name) => quote! { weave::key::named::<#ty>(#name) },
        FieldQualifier::Qualified(qualifier) => quote! { weave::key::qualified::<#ty, _>(#qualifier) },
    }
}

struct FieldAttributeRemovalVisitor;

impl FieldAttributeRemovalVisitor {
    fn is_custom_attribute(attr: &Attribute) -> bool {
        match &attr.meta {
            Meta::Path(path) => path.is_ident("inject"),
            Meta::List(list) => {
                let Some(segment) = list.path.segments.last() else { return false };
                segment.ident == "named" || segment.ident == "qualified"
            }
            Meta::NameValue(_) => false,
        }
    }
}

impl VisitMut for FieldAttributeRemovalVisitor {
    fn visit_attributes_mut(&mut self, attrs: &mut Vec<Attribute>) {
        attrs.retain(|attr| !Self::is_custom_attribute(attr));
        attrs.iter_mut().for_each(|attr| visit_mut::visit_attribute_mut(self, attr));
    }

    fn visit_item_impl_mut(&mut self, _impls: &mut ItemImpl) {
        // Never descend into a sibling `impl` block accidentally captured
        // alongside the struct; this visitor only strips field attributes.
    }
}
