//! Parsing utilities for the `Aggregate` derive macro.
//!
//! The input is validated eagerly so expansion fails with a spanned error
//! before any tokens are generated.

use syn::ext::IdentExt;
use syn::meta::ParseNestedMeta;
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, Type};

mod literals;
mod type_utils;

use literals::{flag, lit_str};
use type_utils::{box_inner, option_inner};

/// Struct-level `#[merge(...)]` metadata.
#[derive(Default)]
pub(crate) struct StructAttrs {
    /// Overrides the generated crate path for dependency aliasing.
    pub crate_path: Option<syn::Path>,
}

/// Field-level `#[merge(...)]` metadata.
#[derive(Default)]
pub(crate) struct FieldAttrs {
    pub from: Option<LitStr>,
    pub into: Option<LitStr>,
    pub nested: bool,
    pub readonly: bool,
    pub skip: bool,
    pub view: bool,
}

/// Indirection around a field's value, with the inner type.
pub(crate) enum FieldShape {
    Direct(Type),
    Optional(Type),
    Boxed(Type),
}

/// A visible field ready for code generation.
pub(crate) struct FieldModel {
    pub ident: syn::Ident,
    pub name: String,
    pub shape: FieldShape,
    pub attrs: FieldAttrs,
}

/// Everything the generator needs about the deriving struct.
pub(crate) struct AggregateInput {
    pub ident: syn::Ident,
    pub struct_attrs: StructAttrs,
    pub fields: Vec<FieldModel>,
}

const FIELD_KEYS: &str = "`from`, `into`, `nested`, `readonly`, `skip`, `view`";

/// Iterate all `#[merge(...)]` attributes once and apply a callback.
fn parse_merge_attrs<F>(attrs: &[Attribute], mut f: F) -> syn::Result<()>
where
    F: FnMut(&ParseNestedMeta) -> syn::Result<()>,
{
    for attr in attrs.iter().filter(|a| a.path().is_ident("merge")) {
        attr.parse_nested_meta(|meta| f(&meta))?;
    }
    Ok(())
}

fn unknown_key(meta: &ParseNestedMeta, allowed: &str) -> syn::Error {
    let key = meta
        .path
        .get_ident()
        .map_or_else(|| String::from("<path>"), ToString::to_string);
    meta.error(format!("unknown merge attribute `{key}`; expected one of {allowed}"))
}

pub(crate) fn parse_struct_attrs(attrs: &[Attribute]) -> syn::Result<StructAttrs> {
    let mut out = StructAttrs::default();
    parse_merge_attrs(attrs, |meta| {
        if meta.path.is_ident("crate") {
            let s = lit_str(meta, "crate")?;
            let path: syn::Path =
                syn::parse_str(&s.value()).map_err(|e| syn::Error::new(s.span(), e))?;
            out.crate_path = Some(path);
            Ok(())
        } else {
            Err(unknown_key(meta, "`crate`"))
        }
    })?;
    Ok(out)
}

pub(crate) fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut out = FieldAttrs::default();
    parse_merge_attrs(attrs, |meta| {
        let Some(ident) = meta.path.get_ident() else {
            return Err(unknown_key(meta, FIELD_KEYS));
        };
        match ident.to_string().as_str() {
            "from" => out.from = Some(lit_str(meta, "from")?),
            "into" => out.into = Some(lit_str(meta, "into")?),
            "nested" => out.nested = flag(meta)?,
            "readonly" => out.readonly = flag(meta)?,
            "skip" => out.skip = flag(meta)?,
            "view" => out.view = flag(meta)?,
            _ => return Err(unknown_key(meta, FIELD_KEYS)),
        }
        Ok(())
    })?;
    Ok(out)
}

/// Classifies `ty` for a leaf (`nested == false`) or aggregate field.
///
/// Leaf fields may be `T` or `Option<T>`; aggregate fields may also be
/// `Option<Box<T>>`. Double indirection is rejected.
pub(crate) fn classify(ty: &Type, nested: bool) -> syn::Result<FieldShape> {
    let Some(inner) = option_inner(ty) else {
        if nested && box_inner(ty).is_some() {
            return Err(syn::Error::new_spanned(
                ty,
                "nested boxed aggregates must be declared as `Option<Box<T>>`",
            ));
        }
        return Ok(FieldShape::Direct(ty.clone()));
    };
    if option_inner(inner).is_some() {
        return Err(syn::Error::new_spanned(
            ty,
            "double indirection (`Option<Option<T>>`) is not supported",
        ));
    }
    if nested {
        if let Some(boxed) = box_inner(inner) {
            return Ok(FieldShape::Boxed(boxed.clone()));
        }
    }
    Ok(FieldShape::Optional(inner.clone()))
}

/// Gathers the struct identifier, its visible fields and their metadata.
pub(crate) fn parse_input(input: &DeriveInput) -> syn::Result<AggregateInput> {
    let ident = input.ident.clone();
    let struct_attrs = parse_struct_attrs(&input.attrs)?;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Aggregate cannot be derived for generic structs",
        ));
    }
    let named = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    data.struct_token,
                    "Aggregate requires named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &ident,
                "Aggregate can only be derived for structs",
            ));
        }
    };

    let mut fields = Vec::new();
    for field in named {
        let attrs = parse_field_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        let Some(field_ident) = field.ident.clone() else {
            return Err(syn::Error::new_spanned(field, "Aggregate requires named fields"));
        };
        if attrs.view && attrs.nested {
            return Err(syn::Error::new_spanned(
                &field.ty,
                "`view` applies to leaf fields only",
            ));
        }
        let shape = classify(&field.ty, attrs.nested)?;
        fields.push(FieldModel {
            name: field_ident.unraw().to_string(),
            ident: field_ident,
            shape,
            attrs,
        });
    }
    Ok(AggregateInput {
        ident,
        struct_attrs,
        fields,
    })
}
