//! Token generation for the `Aggregate` implementation.

use proc_macro2::TokenStream;
use quote::quote;

use super::parse::{AggregateInput, FieldModel, FieldShape};

/// Builds the `FieldSpec` expression declaring `field` in the schema.
pub(crate) fn field_spec(field: &FieldModel, krate: &TokenStream) -> TokenStream {
    let name = &field.name;
    let base = match (&field.shape, field.attrs.nested) {
        (FieldShape::Direct(ty), false) => quote! { #krate::FieldSpec::leaf::<#ty>(#name) },
        (FieldShape::Optional(ty), false) => {
            quote! { #krate::FieldSpec::optional_leaf::<#ty>(#name) }
        }
        (FieldShape::Boxed(ty), false) => {
            quote! { #krate::FieldSpec::optional_leaf::<::std::boxed::Box<#ty>>(#name) }
        }
        (FieldShape::Direct(ty), true) => {
            quote! { #krate::FieldSpec::nested::<#ty>(#name, #krate::Shape::Direct) }
        }
        (FieldShape::Optional(ty), true) => {
            quote! { #krate::FieldSpec::nested::<#ty>(#name, #krate::Shape::Optional) }
        }
        (FieldShape::Boxed(ty), true) => {
            quote! { #krate::FieldSpec::nested::<#ty>(#name, #krate::Shape::Boxed) }
        }
    };
    let from = field.attrs.from.as_ref().map(|lit| quote! { .outbound(#lit) });
    let into = field.attrs.into.as_ref().map(|lit| quote! { .inbound(#lit) });
    let readonly = field.attrs.readonly.then(|| quote! { .readonly() });
    quote! { #base #from #into #readonly }
}

fn read_arm(field: &FieldModel, krate: &TokenStream) -> TokenStream {
    let name = &field.name;
    let ident = &field.ident;
    let handle = match (&field.shape, field.attrs.nested) {
        (FieldShape::Direct(_), false) if field.attrs.view => {
            quote! { #krate::FieldRef::Leaf(#krate::LeafRef::view(&self.#ident)) }
        }
        (FieldShape::Optional(_) | FieldShape::Boxed(_), false) if field.attrs.view => {
            quote! { #krate::FieldRef::Leaf(#krate::LeafRef::optional_view(&self.#ident)) }
        }
        (FieldShape::Direct(_), false) => quote! { #krate::FieldRef::leaf(&self.#ident) },
        (FieldShape::Optional(_) | FieldShape::Boxed(_), false) => {
            quote! { #krate::FieldRef::optional_leaf(&self.#ident) }
        }
        (FieldShape::Direct(_), true) => quote! { #krate::FieldRef::nested(&self.#ident) },
        (FieldShape::Optional(_), true) => {
            quote! { #krate::FieldRef::optional_nested(&self.#ident) }
        }
        (FieldShape::Boxed(_), true) => quote! { #krate::FieldRef::boxed_nested(&self.#ident) },
    };
    quote! { #name => ::core::option::Option::Some(#handle), }
}

fn write_arm(field: &FieldModel, krate: &TokenStream) -> TokenStream {
    let name = &field.name;
    let ident = &field.ident;
    let handle = match (&field.shape, field.attrs.nested) {
        (FieldShape::Direct(_), false) => quote! { #krate::FieldMut::leaf(&mut self.#ident) },
        (FieldShape::Optional(_) | FieldShape::Boxed(_), false) => {
            quote! { #krate::FieldMut::optional_leaf(&mut self.#ident) }
        }
        (FieldShape::Direct(_), true) => quote! { #krate::FieldMut::nested(&mut self.#ident) },
        (FieldShape::Optional(_), true) => {
            quote! { #krate::FieldMut::optional_nested(&mut self.#ident) }
        }
        (FieldShape::Boxed(_), true) => {
            quote! { #krate::FieldMut::boxed_nested(&mut self.#ident) }
        }
    };
    quote! { #name => ::core::option::Option::Some(#handle), }
}

/// Generates the `Aggregate` implementation for `input`.
pub(crate) fn generate_aggregate_impl(input: &AggregateInput, krate: &TokenStream) -> TokenStream {
    let ident = &input.ident;
    let type_name = ident.to_string();
    let specs = input.fields.iter().map(|field| field_spec(field, krate));
    let read_arms = input.fields.iter().map(|field| read_arm(field, krate));
    let write_arms = input.fields.iter().map(|field| write_arm(field, krate));
    quote! {
        #[automatically_derived]
        impl #krate::Aggregate for #ident {
            fn schema(&self) -> &'static #krate::Schema {
                static SCHEMA: ::std::sync::OnceLock<#krate::Schema> =
                    ::std::sync::OnceLock::new();
                SCHEMA.get_or_init(|| {
                    #krate::Schema::new(#type_name, ::std::vec![#(#specs),*])
                })
            }

            fn field(&self, name: &str) -> ::core::option::Option<#krate::FieldRef<'_>> {
                match name {
                    #(#read_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            fn field_mut(
                &mut self,
                name: &str,
            ) -> ::core::option::Option<#krate::FieldMut<'_>> {
                match name {
                    #(#write_arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    }
}
