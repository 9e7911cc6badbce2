//! Literal parsing helpers for derive attributes.

use syn::meta::ParseNestedMeta;
use syn::{Lit, LitBool, LitStr, Token};

/// Parses a string literal assigned to `key`.
///
/// # Examples
///
/// ```rust,ignore
/// // #[merge(from = "source_name,nooverwrite")]
/// let s = lit_str(meta, "from")?;
/// assert_eq!(s.value(), "source_name,nooverwrite");
/// ```
pub(crate) fn lit_str(meta: &ParseNestedMeta, key: &str) -> Result<LitStr, syn::Error> {
    let literal = meta.value()?.parse::<Lit>()?;
    match literal {
        Lit::Str(s) => Ok(s),
        other => Err(syn::Error::new(
            other.span(),
            format!("{key} must be a string"),
        )),
    }
}

/// Parses a flag written either bare (`nested`) or as `nested = true`.
pub(crate) fn flag(meta: &ParseNestedMeta) -> Result<bool, syn::Error> {
    if meta.input.peek(Token![=]) {
        Ok(meta.value()?.parse::<LitBool>()?.value)
    } else {
        Ok(true)
    }
}
