//! Recognition of the `Option<T>` and `Box<T>` wrappers around field types.
//!
//! Only the last path segment is compared, so `std::option::Option<T>`
//! matches as well. Type aliases are not resolved.

use syn::{GenericArgument, PathArguments, Type};

fn single_type_argument<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    if type_path.qself.is_some() {
        return None;
    }
    let segment = type_path.path.segments.last().filter(|s| s.ident == wrapper)?;
    let PathArguments::AngleBracketed(generics) = &segment.arguments else {
        return None;
    };
    match generics.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

/// Inner type of `Option<T>`; one layer only.
pub(crate) fn option_inner(ty: &Type) -> Option<&Type> {
    single_type_argument(ty, "Option")
}

/// Inner type of `Box<T>`.
pub(crate) fn box_inner(ty: &Type) -> Option<&Type> {
    single_type_argument(ty, "Box")
}
