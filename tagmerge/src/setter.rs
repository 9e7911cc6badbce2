//! Field-level assignment with overwrite suppression and type checks.

use tracing::{debug, trace};

use crate::aggregate::{FieldMut, LeafRef};
use crate::directive::Policy;
use crate::error::{MergeError, MergeResult, join_path};
use crate::introspect::InspectedMut;
use crate::schema::{FieldKind, FieldType, Shape};

/// Copies `candidate` into the destination field `name`.
///
/// Returns `Ok(true)` when the field was written. The rules apply in order:
///
/// 1. an empty candidate is never treated as provided;
/// 2. a missing destination field is an error unless the policy tolerates it;
/// 3. read-only fields cannot be written;
/// 4. `nooverwrite` keeps any non-empty destination value (a plain `T` field
///    is never empty);
/// 5. inner value types must match, `T` and `Option<T>` being interchangeable;
/// 6. the candidate is copied, wrapping or unwrapping `Option` as the
///    destination requires.
///
/// # Errors
///
/// Returns [`MergeError::FieldNotFound`], [`MergeError::FieldNotSettable`],
/// [`MergeError::TypeMismatch`] or [`MergeError::NotAddressable`] as described
/// above.
pub fn set_field(
    dest: &mut InspectedMut<'_>,
    name: &str,
    candidate: &LeafRef<'_>,
    policy: &Policy,
) -> MergeResult<bool> {
    let path = join_path(dest.path(), name);
    if candidate.is_null() {
        trace!(%path, "source value is empty; leaving destination untouched");
        return Ok(false);
    }

    let Some(field) = dest.field_schema(name) else {
        if policy.tolerate_missing_pair() {
            trace!(%path, "destination field missing; tolerated");
            return Ok(false);
        }
        return Err(MergeError::FieldNotFound { path });
    };
    if !field.is_settable() {
        return Err(MergeError::FieldNotSettable { path });
    }

    let Some(handle) = dest.field_mut(name) else {
        return Err(MergeError::FieldNotFound { path });
    };
    if policy.suppress_overwrite() && !handle.is_null() {
        trace!(%path, "destination already populated; overwrite suppressed");
        return Ok(false);
    }

    let source_type = FieldType::new(FieldKind::Leaf, candidate.shape(), candidate.value_type());
    let FieldMut::Leaf(mut slot) = handle else {
        return Err(MergeError::TypeMismatch {
            path,
            destination_type: field.ty().to_string(),
            source_type: source_type.to_string(),
        });
    };
    let destination_type = FieldType::new(FieldKind::Leaf, slot.shape(), slot.value_type());
    if !destination_type.is_compatible_with(&source_type) {
        return Err(MergeError::TypeMismatch {
            path,
            destination_type: destination_type.to_string(),
            source_type: source_type.to_string(),
        });
    }

    let Some(owned) = candidate.to_owned_value() else {
        return Err(MergeError::NotAddressable { path });
    };
    if slot.store(owned).is_err() {
        return Err(MergeError::TypeMismatch {
            path,
            destination_type: destination_type.to_string(),
            source_type: source_type.to_string(),
        });
    }
    debug!(
        %path,
        wrapped = slot.shape() == Shape::Optional && candidate.shape() == Shape::Direct,
        unwrapped = slot.shape() == Shape::Direct && candidate.shape() == Shape::Optional,
        "field set"
    );
    Ok(true)
}
