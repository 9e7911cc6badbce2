//! Expansion of `#[derive(Aggregate)]`.

mod crate_path;
mod generate;
mod parse;

use proc_macro2::TokenStream;

/// Parses `input` and generates the `Aggregate` implementation.
pub(crate) fn expand(input: &syn::DeriveInput) -> syn::Result<TokenStream> {
    let parsed = parse::parse_input(input)?;
    let krate = crate_path::resolve(parsed.struct_attrs.crate_path.as_ref());
    Ok(generate::generate_aggregate_impl(&parsed, &krate))
}
