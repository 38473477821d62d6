mod attrs;
mod fields;
mod impls;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use syn::{Item, Result as SynResult};

#[proc_macro_attribute]
pub fn component(attr: TokenStream, item: TokenStream) -> TokenStream {
    match component_impl(attr, item) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}

/// `#[component]` is invoked in two different places: on the `impl` block
/// that carries the constructor (and, optionally, injectable methods), and
/// on the struct/enum item itself to declare injectable fields or mark a
/// type `abstract`. Both forms share one attribute grammar (see
/// [`attrs::AttributeData`]); which expansion runs is decided by peeking at
/// the item kind, since a proc-macro attribute never sees anything besides
/// the single item it's attached to.
fn component_impl(attr: TokenStream, item: TokenStream) -> SynResult<TokenStream2> {
    let attr_data = attrs::parse_attributes(attr)?;

    if is_struct_or_enum(&item) {
        fields::expand_fields(item, attr_data)
    } else {
        impls::expand_implementation(item, attr_data)
    }
}

fn is_struct_or_enum(item: &TokenStream) -> bool {
    matches!(syn::parse::<Item>(item.clone()), Ok(Item::Struct(_)) | Ok(Item::Enum(_)))
}
