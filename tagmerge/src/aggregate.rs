//! The [`Aggregate`] access trait and type-erased field handles.
//!
//! Merges walk aggregates through `dyn Aggregate`, so every field is exposed
//! as either a [`FieldRef`] (read side) or a [`FieldMut`] (write side). Leaf
//! handles carry the inner value as `dyn Any` plus the type information the
//! value setter needs; aggregate handles carry the nested `dyn Aggregate`.
//!
//! `#[derive(Aggregate)]` generates the implementation. Hand-written
//! implementations use the constructors on [`FieldRef`] and [`FieldMut`].

use std::any::Any;
use std::fmt;

use crate::schema::{Schema, Shape, ValueType};

/// A record whose fields can be merged by name.
pub trait Aggregate: Any {
    /// Descriptor table of the concrete type.
    fn schema(&self) -> &'static Schema;

    /// Read handle for the field declared as `name`.
    fn field(&self, name: &str) -> Option<FieldRef<'_>>;

    /// Write handle for the field declared as `name`.
    fn field_mut(&mut self, name: &str) -> Option<FieldMut<'_>>;
}

impl<'a> fmt::Debug for dyn Aggregate + 'a {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("dyn Aggregate")
            .field("type", &self.schema().type_name())
            .finish_non_exhaustive()
    }
}

type CopyFn = fn(&dyn Any) -> Option<Box<dyn Any>>;

fn copy_value<T: Any + Clone>(value: &dyn Any) -> Option<Box<dyn Any>> {
    value
        .downcast_ref::<T>()
        .map(|inner| Box::new(inner.clone()) as Box<dyn Any>)
}

/// Read handle on a leaf field.
#[derive(Clone, Copy)]
pub struct LeafRef<'a> {
    value: Option<&'a dyn Any>,
    value_type: ValueType,
    shape: Shape,
    copy: Option<CopyFn>,
}

impl<'a> LeafRef<'a> {
    /// Handle on a `T` field.
    #[must_use]
    pub fn direct<T: Any + Clone>(value: &'a T) -> Self {
        Self {
            value: Some(value as &dyn Any),
            value_type: ValueType::of::<T>(),
            shape: Shape::Direct,
            copy: Some(copy_value::<T> as CopyFn),
        }
    }

    /// Handle on an `Option<T>` field.
    #[must_use]
    pub fn optional<T: Any + Clone>(value: &'a Option<T>) -> Self {
        Self {
            value: value.as_ref().map(|inner| inner as &dyn Any),
            value_type: ValueType::of::<T>(),
            shape: Shape::Optional,
            copy: Some(copy_value::<T> as CopyFn),
        }
    }

    /// Borrowed view on a `T` field whose value cannot be copied.
    ///
    /// Views can be inspected and compared against destination types, but
    /// merging one into a destination fails with
    /// [`MergeError::NotAddressable`](crate::MergeError::NotAddressable).
    #[must_use]
    pub fn view<T: Any>(value: &'a T) -> Self {
        Self {
            value: Some(value as &dyn Any),
            value_type: ValueType::of::<T>(),
            shape: Shape::Direct,
            copy: None,
        }
    }

    /// Borrowed view on an `Option<T>` field whose value cannot be copied.
    #[must_use]
    pub fn optional_view<T: Any>(value: &'a Option<T>) -> Self {
        Self {
            value: value.as_ref().map(|inner| inner as &dyn Any),
            value_type: ValueType::of::<T>(),
            shape: Shape::Optional,
            copy: None,
        }
    }

    /// Whether the field currently holds no value.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.value.is_none()
    }

    /// Inner value, `None` when the field is empty.
    #[must_use]
    pub const fn value(&self) -> Option<&'a dyn Any> {
        self.value
    }

    /// Inner value type.
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Declared indirection.
    #[must_use]
    pub const fn shape(&self) -> Shape {
        self.shape
    }

    /// Owned copy of the inner value.
    ///
    /// Returns `None` when the field is empty or exposes a borrowed view only.
    #[must_use]
    pub fn to_owned_value(&self) -> Option<Box<dyn Any>> {
        let copy = self.copy?;
        copy(self.value?)
    }

    /// Whether an owned copy can be produced.
    #[must_use]
    pub const fn is_copyable(&self) -> bool {
        self.copy.is_some()
    }
}

impl fmt::Debug for LeafRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafRef")
            .field("type", &self.value_type.name())
            .field("shape", &self.shape)
            .field("null", &self.is_null())
            .finish()
    }
}

/// Read handle on any field.
#[derive(Debug)]
pub enum FieldRef<'a> {
    /// A leaf value.
    Leaf(LeafRef<'a>),
    /// A nested aggregate, `None` when the field is empty.
    Aggregate(Option<&'a dyn Aggregate>),
}

impl<'a> FieldRef<'a> {
    /// Handle on a `T` leaf field.
    #[must_use]
    pub fn leaf<T: Any + Clone>(value: &'a T) -> Self {
        Self::Leaf(LeafRef::direct(value))
    }

    /// Handle on an `Option<T>` leaf field.
    #[must_use]
    pub fn optional_leaf<T: Any + Clone>(value: &'a Option<T>) -> Self {
        Self::Leaf(LeafRef::optional(value))
    }

    /// Handle on a nested `T` aggregate.
    #[must_use]
    pub fn nested<T: Aggregate>(value: &'a T) -> Self {
        Self::Aggregate(Some(value as &dyn Aggregate))
    }

    /// Handle on a nested `Option<T>` aggregate.
    #[must_use]
    pub fn optional_nested<T: Aggregate>(value: &'a Option<T>) -> Self {
        Self::Aggregate(value.as_ref().map(|inner| inner as &dyn Aggregate))
    }

    /// Handle on a nested `Option<Box<T>>` aggregate.
    #[must_use]
    pub fn boxed_nested<T: Aggregate>(value: &'a Option<Box<T>>) -> Self {
        Self::Aggregate(value.as_deref().map(|inner| inner as &dyn Aggregate))
    }

    /// Whether the field currently holds no value.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        match self {
            Self::Leaf(leaf) => leaf.is_null(),
            Self::Aggregate(nested) => nested.is_none(),
        }
    }
}

/// Rejected assignment, returning the value that did not fit.
#[derive(Debug)]
pub struct StoreRejected(pub Box<dyn Any>);

/// Write access to a leaf field behind a type-erased handle.
pub trait LeafSlot {
    /// Inner value type.
    fn value_type(&self) -> ValueType;

    /// Declared indirection.
    fn shape(&self) -> Shape;

    /// Whether the field currently holds no value.
    fn is_null(&self) -> bool;

    /// Stores `value`, which must be the inner value type.
    ///
    /// # Errors
    ///
    /// Returns the value unchanged inside [`StoreRejected`] when it does not
    /// downcast to the field's inner type.
    fn store(&mut self, value: Box<dyn Any>) -> Result<(), StoreRejected>;
}

struct DirectLeaf<'a, T>(&'a mut T);

impl<T: Any> LeafSlot for DirectLeaf<'_, T> {
    fn value_type(&self) -> ValueType {
        ValueType::of::<T>()
    }

    fn shape(&self) -> Shape {
        Shape::Direct
    }

    fn is_null(&self) -> bool {
        false
    }

    fn store(&mut self, value: Box<dyn Any>) -> Result<(), StoreRejected> {
        *self.0 = *value.downcast::<T>().map_err(StoreRejected)?;
        Ok(())
    }
}

struct OptionalLeaf<'a, T>(&'a mut Option<T>);

impl<T: Any> LeafSlot for OptionalLeaf<'_, T> {
    fn value_type(&self) -> ValueType {
        ValueType::of::<T>()
    }

    fn shape(&self) -> Shape {
        Shape::Optional
    }

    fn is_null(&self) -> bool {
        self.0.is_none()
    }

    fn store(&mut self, value: Box<dyn Any>) -> Result<(), StoreRejected> {
        *self.0 = Some(*value.downcast::<T>().map_err(StoreRejected)?);
        Ok(())
    }
}

/// Failure to place an empty aggregate into a field.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MaterializeError(pub String);

impl fmt::Display for MaterializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for MaterializeError {}

/// Write access to a nested aggregate field.
pub trait AggregateSlot {
    /// Whether the field currently holds no aggregate.
    fn is_null(&self) -> bool;

    /// Replaces an empty field with a default-initialised aggregate.
    ///
    /// # Errors
    ///
    /// Returns a [`MaterializeError`] when the slot cannot hold a fresh value.
    fn materialize(&mut self) -> Result<(), MaterializeError>;

    /// The nested aggregate, `None` when the field is empty.
    fn get_mut(&mut self) -> Option<&mut dyn Aggregate>;
}

struct DirectNested<'a, T>(&'a mut T);

impl<T: Aggregate> AggregateSlot for DirectNested<'_, T> {
    fn is_null(&self) -> bool {
        false
    }

    fn materialize(&mut self) -> Result<(), MaterializeError> {
        Ok(())
    }

    fn get_mut(&mut self) -> Option<&mut dyn Aggregate> {
        Some(&mut *self.0 as &mut dyn Aggregate)
    }
}

struct OptionalNested<'a, T>(&'a mut Option<T>);

impl<T: Aggregate + Default> AggregateSlot for OptionalNested<'_, T> {
    fn is_null(&self) -> bool {
        self.0.is_none()
    }

    fn materialize(&mut self) -> Result<(), MaterializeError> {
        self.0.get_or_insert_with(T::default);
        Ok(())
    }

    fn get_mut(&mut self) -> Option<&mut dyn Aggregate> {
        self.0.as_mut().map(|inner| inner as &mut dyn Aggregate)
    }
}

struct BoxedNested<'a, T>(&'a mut Option<Box<T>>);

impl<T: Aggregate + Default> AggregateSlot for BoxedNested<'_, T> {
    fn is_null(&self) -> bool {
        self.0.is_none()
    }

    fn materialize(&mut self) -> Result<(), MaterializeError> {
        self.0.get_or_insert_with(Box::default);
        Ok(())
    }

    fn get_mut(&mut self) -> Option<&mut dyn Aggregate> {
        self.0.as_deref_mut().map(|inner| inner as &mut dyn Aggregate)
    }
}

/// Write handle on any field.
pub enum FieldMut<'a> {
    /// A leaf value.
    Leaf(Box<dyn LeafSlot + 'a>),
    /// A nested aggregate.
    Aggregate(Box<dyn AggregateSlot + 'a>),
}

impl<'a> FieldMut<'a> {
    /// Handle on a `T` leaf field.
    #[must_use]
    pub fn leaf<T: Any>(value: &'a mut T) -> Self {
        Self::Leaf(Box::new(DirectLeaf(value)))
    }

    /// Handle on an `Option<T>` leaf field.
    #[must_use]
    pub fn optional_leaf<T: Any>(value: &'a mut Option<T>) -> Self {
        Self::Leaf(Box::new(OptionalLeaf(value)))
    }

    /// Handle on a nested `T` aggregate.
    #[must_use]
    pub fn nested<T: Aggregate>(value: &'a mut T) -> Self {
        Self::Aggregate(Box::new(DirectNested(value)))
    }

    /// Handle on a nested `Option<T>` aggregate.
    #[must_use]
    pub fn optional_nested<T: Aggregate + Default>(value: &'a mut Option<T>) -> Self {
        Self::Aggregate(Box::new(OptionalNested(value)))
    }

    /// Handle on a nested `Option<Box<T>>` aggregate.
    #[must_use]
    pub fn boxed_nested<T: Aggregate + Default>(value: &'a mut Option<Box<T>>) -> Self {
        Self::Aggregate(Box::new(BoxedNested(value)))
    }

    /// Whether the field currently holds no value.
    #[must_use]
    pub fn is_null(&self) -> bool {
        match self {
            Self::Leaf(slot) => slot.is_null(),
            Self::Aggregate(slot) => slot.is_null(),
        }
    }
}

impl fmt::Debug for FieldMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(slot) => f
                .debug_struct("FieldMut::Leaf")
                .field("type", &slot.value_type().name())
                .field("null", &slot.is_null())
                .finish(),
            Self::Aggregate(slot) => f
                .debug_struct("FieldMut::Aggregate")
                .field("null", &slot.is_null())
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for field handles.

    use super::*;
    use rstest::rstest;

    #[rstest]
    fn optional_leaf_copy_is_independent() {
        let mut original = Some(String::from("before"));
        let copy = LeafRef::optional(&original).to_owned_value();
        original = Some(String::from("after"));
        let copied = copy.and_then(|boxed| boxed.downcast::<String>().ok());
        assert_eq!(copied.as_deref().map(String::as_str), Some("before"));
        assert_eq!(original.as_deref(), Some("after"));
    }

    #[rstest]
    fn views_cannot_be_copied() {
        let value = 5_u8;
        let view = LeafRef::view(&value);
        assert!(!view.is_copyable());
        assert!(view.to_owned_value().is_none());
        assert!(!view.is_null());
    }

    #[rstest]
    fn optional_views_track_emptiness() {
        let empty: Option<u8> = None;
        assert!(LeafRef::optional_view(&empty).is_null());
        let filled = Some(4_u8);
        let view = LeafRef::optional_view(&filled);
        assert!(!view.is_null());
        assert!(!view.is_copyable());
        assert_eq!(view.value().and_then(|v| v.downcast_ref::<u8>()), Some(&4));
    }

    #[rstest]
    fn slots_reject_foreign_types() {
        let mut value = 1_u32;
        let mut handle = FieldMut::leaf(&mut value);
        let FieldMut::Leaf(slot) = &mut handle else {
            panic!("expected a leaf slot");
        };
        assert!(slot.store(Box::new("text")).is_err());
        assert!(slot.store(Box::new(7_u32)).is_ok());
        drop(handle);
        assert_eq!(value, 7);
    }

    #[rstest]
    fn optional_slot_wraps_stored_value() {
        let mut value: Option<u32> = None;
        let mut handle = FieldMut::optional_leaf(&mut value);
        assert!(handle.is_null());
        if let FieldMut::Leaf(slot) = &mut handle {
            assert!(slot.store(Box::new(3_u32)).is_ok());
        }
        drop(handle);
        assert_eq!(value, Some(3));
    }
}
