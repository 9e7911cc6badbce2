//! Root path that generated code uses to reach the runtime crate.
//!
//! Crates that rename their `tagmerge` dependency set
//! `#[merge(crate = "...")]` on the struct.

use proc_macro2::TokenStream;
use quote::{ToTokens, quote};

/// Tokens naming the runtime crate, `tagmerge` unless overridden.
pub(crate) fn resolve(crate_path: Option<&syn::Path>) -> TokenStream {
    crate_path.map_or_else(|| quote! { tagmerge }, ToTokens::to_token_stream)
}
