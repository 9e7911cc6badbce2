//! Statically declared descriptor tables for aggregate types.
//!
//! A [`Schema`] lists every visible field of an aggregate together with its
//! declared [`FieldType`], whether it may be written, and the two independent
//! directive tables. The derive builds one schema per type on first use and
//! caches it in a `static`, so merges never re-derive metadata.

use std::any::{Any, TypeId};
use std::fmt;

use crate::directive::{Direction, Policy};

/// Identity of the value type stored in a field, ignoring `Option` wrapping.
#[derive(Clone, Copy, Debug)]
pub struct ValueType {
    id: TypeId,
    name: &'static str,
}

impl ValueType {
    /// Describes `T`.
    #[must_use]
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Runtime type identifier.
    #[must_use]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name, used in diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ValueType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ValueType {}

/// Whether a field is copied as a value or merged recursively.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldKind {
    /// Copied wholesale by the value setter.
    Leaf,
    /// Another aggregate, merged field by field.
    Aggregate,
}

/// Level of indirection around the stored value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Shape {
    /// `T`; never empty.
    Direct,
    /// `Option<T>`; empty when `None`.
    Optional,
    /// `Option<Box<T>>`; only meaningful for aggregate fields.
    Boxed,
}

/// Declared type of a field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FieldType {
    kind: FieldKind,
    shape: Shape,
    value: ValueType,
}

impl FieldType {
    /// Builds a field type from its parts.
    #[must_use]
    pub const fn new(kind: FieldKind, shape: Shape, value: ValueType) -> Self {
        Self { kind, shape, value }
    }

    /// Leaf or aggregate.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Indirection around the value.
    #[must_use]
    pub const fn shape(&self) -> Shape {
        self.shape
    }

    /// Inner value type.
    #[must_use]
    pub const fn value(&self) -> ValueType {
        self.value
    }

    /// Whether fields of this type recurse instead of being copied.
    #[must_use]
    pub fn is_aggregate(&self) -> bool {
        self.kind == FieldKind::Aggregate
    }

    /// Two declared types are compatible when their inner value types match.
    ///
    /// `T` and `Option<T>` are compatible with each other and with themselves;
    /// no other conversion is applied.
    #[must_use]
    pub fn is_compatible_with(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// Drops module paths from every segment of a `type_name`, so
/// `alloc::vec::Vec<alloc::string::String>` becomes `Vec<String>`.
fn short_type_name(full: &str) -> String {
    fn push_last_segment(out: &mut String, token: &str) {
        out.push_str(token.rsplit_once("::").map_or(token, |(_, last)| last));
    }

    let mut out = String::with_capacity(full.len());
    let mut token = String::new();
    for ch in full.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            token.push(ch);
        } else {
            push_last_segment(&mut out, &token);
            token.clear();
            out.push(ch);
        }
    }
    push_last_segment(&mut out, &token);
    out
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = short_type_name(self.value.name());
        match self.shape {
            Shape::Direct => f.write_str(&name),
            Shape::Optional => write!(f, "Option<{name}>"),
            Shape::Boxed => write!(f, "Option<Box<{name}>>"),
        }
    }
}

/// Describes one field of an aggregate.
#[derive(Clone, Debug)]
pub struct FieldSchema {
    name: &'static str,
    ty: FieldType,
    settable: bool,
    outbound: Option<Policy>,
    inbound: Option<Policy>,
}

impl FieldSchema {
    /// Declared field name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Declared field type.
    #[must_use]
    pub const fn ty(&self) -> FieldType {
        self.ty
    }

    /// Whether the merge engine may write this field.
    #[must_use]
    pub const fn is_settable(&self) -> bool {
        self.settable
    }

    /// Policy parsed from the `from` directive, if any.
    #[must_use]
    pub const fn outbound(&self) -> Option<&Policy> {
        self.outbound.as_ref()
    }

    /// Policy parsed from the `into` directive, if any.
    #[must_use]
    pub const fn inbound(&self) -> Option<&Policy> {
        self.inbound.as_ref()
    }

    /// Policy for `direction`.
    #[must_use]
    pub const fn policy(&self, direction: Direction) -> Option<&Policy> {
        match direction {
            Direction::Outbound => self.outbound(),
            Direction::Inbound => self.inbound(),
        }
    }
}

/// Unparsed field declaration used to build a [`Schema`].
///
/// # Examples
///
/// ```rust
/// use tagmerge::{FieldSpec, Schema};
///
/// let schema = Schema::new(
///     "Profile",
///     vec![
///         FieldSpec::leaf::<String>("name").outbound(""),
///         FieldSpec::optional_leaf::<u32>("age").outbound("years,nooverwrite"),
///     ],
/// );
/// let age = schema.field("age").and_then(|f| f.outbound());
/// assert_eq!(age.map(|p| p.paired_name()), Some("years"));
/// ```
#[derive(Clone, Debug)]
pub struct FieldSpec {
    name: &'static str,
    ty: FieldType,
    settable: bool,
    from: Option<&'static str>,
    into: Option<&'static str>,
}

impl FieldSpec {
    /// Declares a field of arbitrary type.
    #[must_use]
    pub const fn new(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            settable: true,
            from: None,
            into: None,
        }
    }

    /// Declares a `T` leaf field.
    #[must_use]
    pub fn leaf<T: Any>(name: &'static str) -> Self {
        Self::new(
            name,
            FieldType::new(FieldKind::Leaf, Shape::Direct, ValueType::of::<T>()),
        )
    }

    /// Declares an `Option<T>` leaf field.
    #[must_use]
    pub fn optional_leaf<T: Any>(name: &'static str) -> Self {
        Self::new(
            name,
            FieldType::new(FieldKind::Leaf, Shape::Optional, ValueType::of::<T>()),
        )
    }

    /// Declares a nested aggregate field stored as `shape`.
    #[must_use]
    pub fn nested<T: Any>(name: &'static str, shape: Shape) -> Self {
        Self::new(
            name,
            FieldType::new(FieldKind::Aggregate, shape, ValueType::of::<T>()),
        )
    }

    /// Attaches an outbound directive (the `from` attribute key).
    #[must_use]
    pub const fn outbound(mut self, directive: &'static str) -> Self {
        self.from = Some(directive);
        self
    }

    /// Attaches an inbound directive (the `into` attribute key).
    #[must_use]
    pub const fn inbound(mut self, directive: &'static str) -> Self {
        self.into = Some(directive);
        self
    }

    /// Marks the field as not writable by merges.
    #[must_use]
    pub const fn readonly(mut self) -> Self {
        self.settable = false;
        self
    }

    fn build(self) -> FieldSchema {
        FieldSchema {
            name: self.name,
            ty: self.ty,
            settable: self.settable,
            outbound: Policy::parse_optional(self.from, self.name),
            inbound: Policy::parse_optional(self.into, self.name),
        }
    }
}

/// Descriptor table of an aggregate type.
#[derive(Clone, Debug)]
pub struct Schema {
    type_name: &'static str,
    fields: Vec<FieldSchema>,
}

impl Schema {
    /// Parses every directive in `fields` and builds the table.
    ///
    /// Field order is preserved and drives traversal order.
    #[must_use]
    pub fn new(type_name: &'static str, fields: Vec<FieldSpec>) -> Self {
        Self {
            type_name,
            fields: fields.into_iter().map(FieldSpec::build).collect(),
        }
    }

    /// Name of the described type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// All visible fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    /// Looks up a field by declared name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Fields carrying a directive for `direction`, paired with its policy.
    pub fn directives(
        &self,
        direction: Direction,
    ) -> impl Iterator<Item = (&FieldSchema, &Policy)> + '_ {
        self.fields
            .iter()
            .filter_map(move |field| field.policy(direction).map(|policy| (field, policy)))
    }
}
