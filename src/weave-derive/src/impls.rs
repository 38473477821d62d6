use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{quote, ToTokens};
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::token::Comma;
use syn::visit_mut::{self, VisitMut};
use syn::{
    AngleBracketedGenericArguments, Attribute, Error as SynError, FnArg, GenericArgument, Ident,
    ImplItem, ImplItemFn, ItemImpl, Meta, Path, PathArguments, Receiver, Result as SynResult,
    ReturnType, Signature, Type, TypePath,
};

use crate::attrs::AttributeData;

#[derive(Debug)]
struct ConstructorData {
    self_type: TypePath,
    identifier: Ident,
    arguments: Vec<ArgumentData>,
    return_type: ReturnTypeData,
}

#[derive(Debug)]
struct MethodData {
    identifier: Ident,
    name: String,
    arguments: Vec<ArgumentData>,
}

#[derive(Debug)]
struct ArgumentData {
    span: Span,
    /// The dependency's own target type: `Lazy<T>` unwraps to `T` here, with
    /// `indirection` recording that it did.
    ty: Type,
    indirection: Indirection,
    qualifier: QualifierData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Indirection {
    Direct,
    Lazy,
}

#[derive(Debug)]
enum QualifierData {
    None,
    Named(TokenStream2),
    Qualified(TokenStream2),
}

#[derive(Debug)]
enum ReturnTypeData {
    Infallible,
    Result { error_type: TypePath },
}

struct AttributeRemovalVisitor;

impl AttributeRemovalVisitor {
    fn is_custom_attribute(attr: &Attribute) -> bool {
        if let Meta::Path(path) = &attr.meta {
            if path.segments.first().is_some_and(|s| s.ident == "inject") {
                return true;
            }
        } else if let Meta::List(list) = &attr.meta {
            if let Some(s) = list.path.segments.first() {
                if s.ident == "named" || s.ident == "qualified" {
                    return true;
                }
            }
        }
        false
    }
}

impl VisitMut for AttributeRemovalVisitor {
    fn visit_attributes_mut(&mut self, attrs: &mut Vec<Attribute>) {
        attrs.retain(|attr| !Self::is_custom_attribute(attr));
        attrs.iter_mut().for_each(|attr| visit_mut::visit_attribute_mut(self, attr));
    }
}

pub fn expand_implementation(impls: TokenStream, attr_data: AttributeData) -> SynResult<TokenStream2> {
    let mut impls = match syn::parse::<ItemImpl>(impls) {
        Ok(impls) => impls,
        Err(err) => {
            return Err(SynError::new(err.span(), "`#[component]` should be annotated on the `impl` block"));
        }
    };

    let self_type = get_self_type(&impls)?;
    let (ctor_sig, method_sigs) = partition_inject_fns(&impls.items, impls.span())?;
    let plain_method_names = collect_plain_method_names(&impls.items);
    let ctor_data = parse_constructor(self_type.clone(), ctor_sig)?;
    let methods = method_sigs
        .into_iter()
        .map(|sig| parse_method(sig))
        .collect::<SynResult<Vec<_>>>()?;

    let expanded = expand_component_implementation(&ctor_data, &methods, &plain_method_names, &attr_data)?;

    let mut visitor = AttributeRemovalVisitor;
    visitor.visit_item_impl_mut(&mut impls);

    Ok(quote! {
        #impls
        #expanded
    })
}

fn get_self_type(impls: &ItemImpl) -> SynResult<TypePath> {
    if let Type::Path(ty) = impls.self_ty.as_ref() {
        Ok(ty.clone())
    } else {
        Err(SynError::new(impls.self_ty.span(), "invalid self type"))
    }
}

fn filter_and_map_item_fn(item: &ImplItem) -> Option<&ImplItemFn> {
    if let ImplItem::Fn(impl_fn) = item {
        Some(impl_fn)
    } else {
        None
    }
}

fn is_annotated_with_inject(item_fn: &&ImplItemFn) -> bool {
    item_fn.attrs.iter().any(|attr| attr.meta.to_token_stream().to_string() == "inject")
}

fn has_receiver(sig: &Signature) -> bool {
    matches!(sig.inputs.first(), Some(FnArg::Receiver(_)))
}

fn partition_inject_fns(items: &[ImplItem], impl_span: Span) -> SynResult<(Signature, Vec<Signature>)> {
    let injected: Vec<_> = items.iter().filter_map(filter_and_map_item_fn).filter(is_annotated_with_inject).collect();

    let ctors: Vec<_> = injected.iter().filter(|f| !has_receiver(&f.sig)).collect();
    let methods: Vec<_> = injected.iter().filter(|f| has_receiver(&f.sig)).collect();

    let ctor_sig = if ctors.len() > 1 {
        return Err(SynError::new(impl_span, "only one associated function can be annotated with `#[inject]` as a constructor"));
    } else if let Some(ctor) = ctors.first() {
        ctor.sig.clone()
    } else {
        return Err(SynError::new(impl_span, "no associated function is annotated with `#[inject]`"));
    };

    for method in &methods {
        if let Some(FnArg::Receiver(rec)) = method.sig.inputs.first() {
            if rec.reference.is_none() || rec.mutability.is_none() {
                return Err(SynError::new(rec.span(), "an injectable method must take `&mut self`"));
            }
        }
        if !method.sig.generics.params.is_empty() {
            return Err(SynError::new(
                method.sig.generics.span(),
                "an injectable method is not allowed to have its own generic parameters",
            ));
        }
    }

    Ok((ctor_sig, methods.into_iter().map(|f| f.sig.clone()).collect()))
}

/// Names of `&mut self` methods declared in this impl block *without*
/// `#[inject]`. When this type is the one actually bound (the leaf of an
/// `extends` chain, or a standalone component), these names are passed down
/// as the `skip` set: a name the leaf chose to keep as a plain method,
/// rather than re-annotating, is never called through injection at any
/// level of the chain, even if an ancestor still declares it with
/// `#[inject]`.
fn collect_plain_method_names(items: &[ImplItem]) -> Vec<String> {
    items
        .iter()
        .filter_map(filter_and_map_item_fn)
        .filter(|f| has_receiver(&f.sig) && !is_annotated_with_inject(&f))
        .filter(|f| matches!(&f.sig.inputs[0], FnArg::Receiver(rec) if rec.reference.is_some() && rec.mutability.is_some()))
        .map(|f| f.sig.ident.to_string())
        .collect()
}

fn parse_constructor(self_type: TypePath, signature: Signature) -> SynResult<ConstructorData> {
    let identifier = signature.ident.clone();
    let arguments = parse_typed_arguments(signature.inputs)?;
    let return_type = parse_constructor_return_type(signature.output, &self_type)?;

    Ok(ConstructorData {
        self_type,
        identifier,
        arguments,
        return_type,
    })
}

fn parse_method(signature: Signature) -> SynResult<MethodData> {
    let identifier = signature.ident.clone();
    let name = identifier.to_string();
    let inputs = signature
        .inputs
        .into_iter()
        .filter(|arg| !matches!(arg, FnArg::Receiver(Receiver { .. })))
        .collect();
    let arguments = parse_typed_arguments(inputs)?;

    Ok(MethodData { identifier, name, arguments })
}

fn parse_typed_arguments(inputs: Punctuated<FnArg, Comma>) -> SynResult<Vec<ArgumentData>> {
    inputs
        .into_iter()
        .map(|arg| match arg {
            FnArg::Typed(arg) => arg,
            FnArg::Receiver(_) => unreachable!("receivers are filtered out before this point"),
        })
        .map(|arg| {
            let span = arg.span();
            let (ty, indirection) = unwrap_lazy(*arg.ty);
            parse_argument_attributes(arg.attrs).map(|qualifier| ArgumentData {
                span,
                ty,
                indirection,
                qualifier,
            })
        })
        .collect()
}

/// `Lazy<T>` is recognized by its final path segment, so both a bare `Lazy`
/// brought into scope and a fully qualified `weave::reference::Lazy` match.
fn unwrap_lazy(ty: Type) -> (Type, Indirection) {
    if let Type::Path(TypePath { path, qself: None }) = &ty {
        if let Some(segment) = path.segments.last() {
            if segment.ident == "Lazy" {
                if let PathArguments::AngleBracketed(AngleBracketedGenericArguments { args, .. }) = &segment.arguments {
                    if args.len() == 1 {
                        if let Some(GenericArgument::Type(inner)) = args.first() {
                            return (inner.clone(), Indirection::Lazy);
                        }
                    }
                }
            }
        }
    }
    (ty, Indirection::Direct)
}

fn parse_argument_attributes(attrs: Vec<Attribute>) -> SynResult<QualifierData> {
    let mut res = None;

    for attr in attrs {
        match attr.meta {
            Meta::List(list) => {
                let list_span = list.span();
                let attr_name = &list.path.segments.first().unwrap().ident;

                let data = if attr_name == "named" {
                    QualifierData::Named(list.tokens)
                } else if attr_name == "qualified" {
                    QualifierData::Qualified(list.tokens)
                } else {
                    continue;
                };

                if res.is_some() {
                    return Err(SynError::new(list_span, "only one of `#[named(...)]` or `#[qualified(...)]` is allowed"));
                }
                res = Some(data);
            }
            Meta::Path(path) => {
                let attr_name = &path.segments.first().unwrap().ident;
                if attr_name == "named" {
                    return Err(SynError::new(path.span(), "expects `#[named(...)]` to receive a `&'static str`"));
                } else if attr_name == "qualified" {
                    return Err(SynError::new(path.span(), "expects `#[qualified(...)]` to receive a qualifier value"));
                }
            }
            Meta::NameValue(nv) => {
                let attr_name = &nv.path.segments.first().unwrap().ident;
                if attr_name == "named" {
                    return Err(SynError::new(nv.span(), "expects `#[named(...)]` to receive a `&'static str`"));
                } else if attr_name == "qualified" {
                    return Err(SynError::new(nv.span(), "expects `#[qualified(...)]` to receive a qualifier value"));
                }
            }
        }
    }

    Ok(res.unwrap_or(QualifierData::None))
}

fn parse_constructor_return_type(output: ReturnType, self_type: &TypePath) -> SynResult<ReturnTypeData> {
    let ReturnType::Type(_, return_type) = output else {
        return Err(SynError::new(output.span(), "a constructor's return type should be `Self` or `Result<Self, E>`"));
    };
    let Type::Path(return_type) = *return_type else {
        return Err(SynError::new(return_type.span(), "a constructor's return type should be `Self` or `Result<Self, E>`"));
    };

    let segments = &return_type.path.segments;

    let return_type = if &return_type == self_type {
        ReturnTypeData::Infallible
    } else if segments.len() == 1 && segments.first().unwrap().ident == "Self" {
        ReturnTypeData::Infallible
    } else if segments.len() == 1 && segments.first().unwrap().ident == "Result" {
        parse_result_return_type(&segments.first().unwrap().arguments, self_type)?
    } else if segments.len() == 3
        && segments[0].ident == "std"
        && segments[1].ident == "result"
        && segments[2].ident == "Result"
    {
        parse_result_return_type(&segments[2].arguments, self_type)?
    } else {
        return Err(SynError::new(return_type.span(), "a constructor's return type should be `Self` or `Result<Self, E>`"));
    };
    Ok(return_type)
}

fn parse_result_return_type(type_args: &PathArguments, self_type: &TypePath) -> SynResult<ReturnTypeData> {
    let PathArguments::AngleBracketed(AngleBracketedGenericArguments { args: type_args, .. }) = type_args else {
        return Err(SynError::new(type_args.span(), "a constructor's return type should be `Self` or `Result<Self, E>`"));
    };

    if type_args.len() != 2 {
        return Err(SynError::new(type_args.span(), "a constructor's return type should be `Self` or `Result<Self, E>`"));
    }

    let GenericArgument::Type(Type::Path(first_type)) = type_args.first().unwrap() else {
        return Err(SynError::new(type_args.span(), "a constructor's return type should be `Self` or `Result<Self, E>`"));
    };
    let GenericArgument::Type(Type::Path(second_type)) = type_args.get(1).unwrap() else {
        return Err(SynError::new(type_args.span(), "a constructor's return type should be `Self` or `Result<Self, E>`"));
    };

    let segments = &first_type.path.segments;

    if first_type == self_type || segments.first().is_some_and(|s| s.ident == "Self") {
        Ok(ReturnTypeData::Result {
            error_type: second_type.clone(),
        })
    } else {
        Err(SynError::new(type_args.span(), "a constructor's return type should be `Self` or `Result<Self, E>`"))
    }
}

fn key_expr(arg: &ArgumentData) -> TokenStream2 {
    match &arg.qualifier {
        QualifierData::None => quote! { weave::key::of() },
        QualifierData::Named(name) => quote! { weave::key::named(#name) },
        QualifierData::Qualified(qualifier) => quote! { weave::key::qualified(#qualifier) },
    }
}

fn typed_key_expr(arg: &ArgumentData) -> TokenStream2 {
    let ty = &arg.ty;
    match &arg.qualifier {
        QualifierData::None => quote! { weave::key::of::<#ty>() },
        QualifierData::Named(name) => quote! { weave::key::named::<#ty>(#name) },
        QualifierData::Qualified(qualifier) => quote! { weave::key::qualified::<#ty, _>(#qualifier) },
    }
}

fn dependency_entry(arg: &ArgumentData) -> TokenStream2 {
    let key = typed_key_expr(arg);
    match arg.indirection {
        Indirection::Direct => quote! { weave::reference::Dependency::direct(std::boxed::Box::new(#key)) },
        Indirection::Lazy => quote! { weave::reference::Dependency::lazy(std::boxed::Box::new(#key)) },
    }
}

fn get_statement(ident: &Ident, arg: &ArgumentData) -> TokenStream2 {
    let key = key_expr(arg);
    match arg.indirection {
        Indirection::Direct => quote! {
            let #ident = injector.get(#key)?.unwrap_or_else(|| {
                std::unreachable!("validated graphs never reach a missing dependency at construction time")
            });
        },
        Indirection::Lazy => quote! {
            let #ident = injector.get_lazy(#key).unwrap_or_else(|| {
                std::unreachable!("validated graphs always have their lazy dependency bound")
            });
        },
    }
}

/// Builds the composed `base: Base` field raw, running only `Base`'s own
/// constructor. Field and method injection for `base` are deferred to the
/// composing type's own `inject_fields`/`inject_methods`, which recurse into
/// `self.base` exactly once, base-first, alongside the composing type's own
/// injection sites.
fn base_get_statement(ident: &Ident, base: &Path) -> TokenStream2 {
    quote! {
        let #ident = match <#base as weave::provider::component::Component>::construct(injector)? {
            std::result::Result::Ok(base_raw) => base_raw,
            std::result::Result::Err(err) => {
                return std::result::Result::Ok(std::result::Result::Err(std::convert::From::from(err)));
            }
        };
    }
}

fn expand_component_implementation(
    ctor_data: &ConstructorData,
    methods: &[MethodData],
    plain_method_names: &[String],
    attr_data: &AttributeData,
) -> SynResult<TokenStream2> {
    let self_type = &ctor_data.self_type;
    let constructor = &ctor_data.identifier;

    let associated_type_constructed = if let Some(output_type) = &attr_data.output_type {
        quote! { type Constructed = #output_type; }
    } else {
        quote! { type Constructed = #self_type; }
    };

    let associated_type_error = if let ReturnTypeData::Result { error_type } = &ctor_data.return_type {
        quote! { type Error = #error_type; }
    } else {
        quote! { type Error = std::convert::Infallible; }
    };

    // The argument whose type matches `extends = Base` is not an ordinary
    // dependency: resolving it through `injector.get` would run `Base`'s own
    // `inject_methods` as part of *its* independent construction, before
    // `self.base.run_as_ancestor` below gets a chance to run it base-first
    // and override-aware. Instead it's built raw (construct + inject_fields
    // only); method injection for the whole chain happens once, from the
    // top, after the composed value exists.
    let is_base_argument = |arg: &ArgumentData| {
        attr_data
            .extends
            .as_ref()
            .is_some_and(|base| base.to_token_stream().to_string() == arg.ty.to_token_stream().to_string())
    };

    let ctor_dep_idents: Vec<_> = (0..ctor_data.arguments.len()).map(|i| Ident::new(&format!("dep{i}"), Span::call_site())).collect();
    let ctor_get_statements: TokenStream2 = ctor_data
        .arguments
        .iter()
        .zip(&ctor_dep_idents)
        .map(|(arg, ident)| {
            if is_base_argument(arg) {
                let base = attr_data.extends.as_ref().unwrap();
                base_get_statement(ident, base)
            } else {
                get_statement(ident, arg)
            }
        })
        .collect();

    let wire_deps = if let ReturnTypeData::Infallible = &ctor_data.return_type {
        quote! { Ok(Ok(#self_type::#constructor(#(#ctor_dep_idents),*))) }
    } else {
        quote! { Ok(#self_type::#constructor(#(#ctor_dep_idents),*)) }
    };

    let post_process_body = if let Some(post_processor) = &attr_data.post_processor {
        quote! { #post_processor(self) }
    } else {
        quote! { self }
    };

    let own_method_names: Vec<&str> = methods.iter().map(|m| m.name.as_str()).collect();

    let own_method_calls: TokenStream2 = methods
        .iter()
        .map(|method| {
            let ident = &method.identifier;
            let name = &method.name;
            let dep_idents: Vec<_> = (0..method.arguments.len())
                .map(|i| Ident::new(&format!("{}_{i}", method.name), Span::call_site()))
                .collect();
            let get_statements: TokenStream2 = method
                .arguments
                .iter()
                .zip(&dep_idents)
                .map(|(arg, dep_ident)| get_statement(dep_ident, arg))
                .collect();
            quote! {
                if !skip.contains(#name) && !claimed_before.contains(#name) {
                    #get_statements
                    self.#ident(#(#dep_idents),*);
                }
            }
        })
        .collect();

    let base_dependencies = attr_data.extends.as_ref().map(|base| {
        quote! { deps.extend(<#base as weave::provider::component::Component>::dependencies()); }
    });

    let own_field_dependencies = if attr_data.fields {
        quote! { deps.extend(Self::own_field_dependencies()); }
    } else {
        quote! {}
    };

    let ctor_dependencies_body: TokenStream2 = ctor_data
        .arguments
        .iter()
        .filter(|arg| !is_base_argument(arg))
        .map(|arg| {
            let entry = dependency_entry(arg);
            quote! { #entry, }
        })
        .collect();

    let method_dependencies_body: TokenStream2 = methods
        .iter()
        .flat_map(|m| m.arguments.iter())
        .map(|arg| {
            let entry = dependency_entry(arg);
            quote! { #entry, }
        })
        .collect();

    let scope_name_impl = attr_data.scope.as_ref().map(|name| {
        quote! {
            fn scope_name() -> Option<&'static str> {
                Some(#name)
            }
        }
    });

    let inject_fields_impl = if attr_data.extends.is_some() || attr_data.fields {
        let base_call = attr_data.extends.as_ref().map(|_| {
            quote! {
                weave::provider::component::Component::inject_fields(&mut self.base, injector)?;
            }
        });
        let own_call = if attr_data.fields {
            quote! { self.inject_own_fields(injector)?; }
        } else {
            quote! {}
        };
        Some(quote! {
            fn inject_fields<I>(&mut self, injector: &I) -> std::result::Result<(), weave::error::Error>
            where
                I: weave::context::TypedInjector + ?Sized,
            {
                #base_call
                #own_call
                Ok(())
            }
        })
    } else {
        None
    };

    let base_run_as_ancestor = attr_data.extends.as_ref().map(|base| {
        quote! {
            <#base as weave::provider::component::ComponentMethods>::run_as_ancestor(&mut self.base, injector, skip, claimed)?;
        }
    });

    let all_inject_method_names_impl = attr_data.extends.as_ref().map(|base| {
        quote! {
            fn all_inject_method_names() -> std::collections::HashSet<&'static str>
            where
                Self: Sized,
            {
                let mut names = Self::own_inject_method_names();
                names.extend(<#base as weave::provider::component::ComponentMethods>::all_inject_method_names());
                names
            }
        }
    });

    Ok(quote! {
        impl weave::provider::component::Component for #self_type {
            #associated_type_constructed
            #associated_type_error

            fn construct<I>(injector: &I) -> std::result::Result<std::result::Result<Self, Self::Error>, weave::error::Error>
            where
                I: weave::context::TypedInjector + ?Sized,
            {
                #ctor_get_statements
                #wire_deps
            }

            #inject_fields_impl

            fn inject_methods<I>(&mut self, injector: &I) -> std::result::Result<(), weave::error::Error>
            where
                I: weave::context::TypedInjector + ?Sized,
            {
                let skip: std::collections::HashSet<&'static str> = [#(#plain_method_names),*].into_iter().collect();
                let mut claimed: std::collections::HashSet<&'static str> = std::collections::HashSet::new();
                weave::provider::component::ComponentMethods::run_as_ancestor(self, injector, &skip, &mut claimed)
            }

            fn post_process(self) -> Self::Constructed {
                #post_process_body
            }

            fn dependencies() -> std::vec::Vec<weave::reference::Dependency> {
                let mut deps = std::vec::Vec::new();
                #base_dependencies
                deps.extend([#ctor_dependencies_body]);
                #own_field_dependencies
                deps.extend([#method_dependencies_body]);
                deps
            }

            #scope_name_impl
        }

        impl weave::provider::component::ComponentMethods for #self_type {
            fn own_inject_method_names() -> std::collections::HashSet<&'static str>
            where
                Self: Sized,
            {
                [#(#own_method_names),*].into_iter().collect()
            }

            #all_inject_method_names_impl

            fn run_as_ancestor<I>(
                &mut self,
                injector: &I,
                skip: &std::collections::HashSet<&'static str>,
                claimed: &mut std::collections::HashSet<&'static str>,
            ) -> std::result::Result<(), weave::error::Error>
            where
                I: weave::context::TypedInjector + ?Sized,
            {
                let claimed_before = claimed.clone();
                claimed.extend(Self::own_inject_method_names());
                #base_run_as_ancestor
                #own_method_calls
                Ok(())
            }
        }
    })
}
