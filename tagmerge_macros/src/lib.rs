//! Procedural macros for `tagmerge`.
//!
//! `#[derive(Aggregate)]` emits the descriptor table and field accessors that
//! let `tagmerge` merge a struct by field name. Field attributes:
//!
//! - `from = "..."`: outbound directive, consumed when the struct is the
//!   destination of `merge_by_destination`;
//! - `into = "..."`: inbound directive, consumed when the struct is the
//!   source of `merge_by_source`;
//! - `nested`: the field holds another aggregate (`T`, `Option<T>` or
//!   `Option<Box<T>>`) and is merged recursively;
//! - `readonly`: the field can be read but never written by a merge;
//! - `skip`: the field is invisible to merges;
//! - `view`: the field is read through a borrowed view, so its type need not
//!   implement `Clone`. Copying it out of the struct fails with
//!   `NotAddressable`, though it can still be written.
//!
//! Every other visible leaf field must implement `Clone`, even when it carries
//! no directive. Nested `Option<T>` and `Option<Box<T>>` fields require
//! `T: Default` so empty destinations can be filled.
//!
//! The struct attribute `#[merge(crate = "path")]` points generated code at a
//! renamed `tagmerge` dependency.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod derive;

/// Derive macro for `tagmerge::Aggregate`.
#[proc_macro_derive(Aggregate, attributes(merge))]
pub fn derive_aggregate(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
