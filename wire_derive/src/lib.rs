//! Proc macro definitions for the mesh control wire format

use proc_macro2::TokenStream;
use quote::{quote, quote_spanned};
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Field, Fields, Index, Type, parse_macro_input};

/// Auto implement wire serialization and deserialization for a struct.
///
/// Every field is written in declaration order using its own `Serializable` implementation.
/// Fields that need a different representation on the wire are annotated with
/// `#[wire(as = HELPER)]`, see `shared::wire` for the available helpers.
///
/// # Example
/// ```ignore
/// #[derive(Clone, Debug, PartialEq, Eq, WireSerde)]
/// pub struct Reset {
///     pub is_broadcast: bool,
///     #[wire(as = Reversed)]
///     pub target_mac: MacAddr,
/// }
/// ```
#[proc_macro_derive(WireSerde, attributes(wire))]
pub fn derive_wire_serde(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        _ => {
            return Err(syn::Error::new(
                input.span(),
                "WireSerde can only be derived for structs",
            ));
        }
    };

    let mut ser = vec![];
    let mut des = vec![];

    for (i, f) in fields.iter().enumerate() {
        let (s, d) = field_actions(f, i)?;
        ser.push(s);
        des.push(d);
    }

    let construct = match fields {
        Fields::Named(_) => quote! { Ok(Self { #(#des)* }) },
        Fields::Unnamed(_) => quote! { Ok(Self ( #(#des)* )) },
        Fields::Unit => quote! { Ok(Self) },
    };

    Ok(quote! {
        impl crate::wire::Serializable for #name {
            fn serialize(&self, ser: &mut crate::wire::Serializer<'_>) -> anyhow::Result<()> {
                #(#ser)*
                Ok(())
            }
        }

        impl crate::wire::Deserializable for #name {
            fn deserialize(des: &mut crate::wire::Deserializer<'_>) -> anyhow::Result<Self> {
                #construct
            }
        }
    })
}

/// Reads the `#[wire(as = HELPER)]` hint of a field, if there is one
fn helper_hint(field: &Field) -> syn::Result<Option<Type>> {
    let mut hint = None;

    for attr in field.attrs.iter().filter(|a| a.path().is_ident("wire")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("as") {
                hint = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("unsupported wire attribute, expected `as = HELPER`"))
            }
        })?;
    }

    Ok(hint)
}

/// Builds the serialize statement and the deserialize expression for one field
fn field_actions(field: &Field, index: usize) -> syn::Result<(TokenStream, TokenStream)> {
    let span = field.span();
    let ty = &field.ty;

    let access = match &field.ident {
        Some(ident) => quote! { self.#ident },
        None => {
            let index = Index::from(index);
            quote! { self.#index }
        }
    };

    let (ser, des) = match helper_hint(field)? {
        Some(helper) => (
            quote_spanned! {span=> <#helper as crate::wire::WireHelper<#ty>>::serialize_as(&#access, ser)?; },
            quote_spanned! {span=> <#helper as crate::wire::WireHelper<#ty>>::deserialize_as(des)? },
        ),
        None => (
            quote_spanned! {span=> crate::wire::Serializable::serialize(&#access, ser)?; },
            quote_spanned! {span=> <#ty as crate::wire::Deserializable>::deserialize(des)? },
        ),
    };

    let des = match &field.ident {
        Some(ident) => quote! { #ident: #des, },
        None => quote! { #des, },
    };

    Ok((ser, des))
}
