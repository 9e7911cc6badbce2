//! Validated views over the aggregates taking part in one merge frame.
//!
//! [`Inspected`] wraps the read side and [`InspectedMut`] the write side.
//! Construction validates the aggregate eagerly: every field carrying an
//! outbound directive must be settable, whether or not the current merge
//! visits it, so a mis-declared type fails on first use rather than on the
//! first payload that happens to reach the field.

use tracing::trace;

use crate::aggregate::{Aggregate, FieldMut, FieldRef};
use crate::directive::{Direction, Policy};
use crate::error::{MergeError, MergeResult, join_path};
use crate::schema::{FieldSchema, Schema};

fn check_outbound_settable(schema: &Schema, parent: &str) -> MergeResult<()> {
    match schema
        .directives(Direction::Outbound)
        .find(|(field, _)| !field.is_settable())
    {
        Some((field, _)) => Err(MergeError::FieldNotSettable {
            path: join_path(parent, field.name()),
        }),
        None => Ok(()),
    }
}

/// Read-only view over a source aggregate.
pub struct Inspected<'a> {
    value: &'a dyn Aggregate,
    schema: &'static Schema,
    path: &'a str,
}

impl<'a> Inspected<'a> {
    /// Validates `value` as an aggregate reached at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::FieldNotSettable`] when an outbound directive is
    /// attached to a read-only field.
    pub fn new(value: &'a dyn Aggregate, path: &'a str) -> MergeResult<Self> {
        let schema = value.schema();
        check_outbound_settable(schema, path)?;
        trace!(type_name = schema.type_name(), path, "inspected source aggregate");
        Ok(Self {
            value,
            schema,
            path,
        })
    }

    /// Descriptor table of the aggregate.
    #[must_use]
    pub const fn schema(&self) -> &'static Schema {
        self.schema
    }

    /// Dotted path at which the aggregate was reached.
    #[must_use]
    pub const fn path(&self) -> &'a str {
        self.path
    }

    /// Fields carrying an outbound directive.
    pub fn outbound(&self) -> impl Iterator<Item = (&'static FieldSchema, &'static Policy)> {
        self.schema.directives(Direction::Outbound)
    }

    /// Fields carrying an inbound directive.
    pub fn inbound(&self) -> impl Iterator<Item = (&'static FieldSchema, &'static Policy)> {
        self.schema.directives(Direction::Inbound)
    }

    /// Schema entry and current value of the field declared as `name`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<(&'static FieldSchema, FieldRef<'a>)> {
        let schema = self.schema.field(name)?;
        let value = self.value.field(name)?;
        Some((schema, value))
    }

    /// Whether the field exists on this aggregate.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.schema.field(name).is_some()
    }

    /// Whether the named field exists and is currently empty.
    #[must_use]
    pub fn is_null(&self, name: &str) -> bool {
        self.value.field(name).is_some_and(|field| field.is_null())
    }
}

/// Exclusive view over a destination aggregate.
pub struct InspectedMut<'a> {
    value: &'a mut dyn Aggregate,
    schema: &'static Schema,
    path: &'a str,
}

impl<'a> InspectedMut<'a> {
    /// Validates `value` as an aggregate reached at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::FieldNotSettable`] when an outbound directive is
    /// attached to a read-only field.
    pub fn new(value: &'a mut dyn Aggregate, path: &'a str) -> MergeResult<Self> {
        let schema = value.schema();
        check_outbound_settable(schema, path)?;
        trace!(
            type_name = schema.type_name(),
            path, "inspected destination aggregate"
        );
        Ok(Self {
            value,
            schema,
            path,
        })
    }

    /// Descriptor table of the aggregate.
    #[must_use]
    pub const fn schema(&self) -> &'static Schema {
        self.schema
    }

    /// Dotted path at which the aggregate was reached.
    #[must_use]
    pub const fn path(&self) -> &'a str {
        self.path
    }

    /// Fields carrying an outbound directive.
    pub fn outbound(&self) -> impl Iterator<Item = (&'static FieldSchema, &'static Policy)> {
        self.schema.directives(Direction::Outbound)
    }

    /// Fields carrying an inbound directive.
    pub fn inbound(&self) -> impl Iterator<Item = (&'static FieldSchema, &'static Policy)> {
        self.schema.directives(Direction::Inbound)
    }

    /// Schema entry of the field declared as `name`.
    #[must_use]
    pub fn field_schema(&self, name: &str) -> Option<&'static FieldSchema> {
        self.schema.field(name)
    }

    /// Current value of the field declared as `name`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        self.value.field(name)
    }

    /// Write handle on the field declared as `name`.
    pub fn field_mut(&mut self, name: &str) -> Option<FieldMut<'_>> {
        self.value.field_mut(name)
    }

    /// Whether the named field exists and is currently empty.
    #[must_use]
    pub fn is_null(&self, name: &str) -> bool {
        self.field(name).is_some_and(|field| field.is_null())
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for aggregate introspection.

    use std::sync::OnceLock;

    use super::*;
    use crate::schema::FieldSpec;
    use anyhow::{Result, ensure};
    use rstest::rstest;

    #[derive(Default)]
    struct Locked {
        id: u32,
        note: Option<String>,
    }

    impl Aggregate for Locked {
        fn schema(&self) -> &'static Schema {
            static SCHEMA: OnceLock<Schema> = OnceLock::new();
            SCHEMA.get_or_init(|| {
                Schema::new(
                    "Locked",
                    vec![
                        FieldSpec::leaf::<u32>("id").outbound("").readonly(),
                        FieldSpec::optional_leaf::<String>("note").inbound("comment"),
                    ],
                )
            })
        }

        fn field(&self, name: &str) -> Option<FieldRef<'_>> {
            match name {
                "id" => Some(FieldRef::leaf(&self.id)),
                "note" => Some(FieldRef::optional_leaf(&self.note)),
                _ => None,
            }
        }

        fn field_mut(&mut self, name: &str) -> Option<FieldMut<'_>> {
            match name {
                "id" => Some(FieldMut::leaf(&mut self.id)),
                "note" => Some(FieldMut::optional_leaf(&mut self.note)),
                _ => None,
            }
        }
    }

    #[rstest]
    fn readonly_outbound_field_fails_fast() {
        let mut value = Locked::default();
        let err = InspectedMut::new(&mut value, "parent").err();
        assert!(matches!(
            err,
            Some(MergeError::FieldNotSettable { ref path }) if path == "parent.id"
        ));
        assert!(Inspected::new(&value, "").is_err());
    }

    /// Settable aggregate carrying both directive kinds on one field.
    #[derive(Default)]
    struct Open {
        note: Option<String>,
    }

    impl Aggregate for Open {
        fn schema(&self) -> &'static Schema {
            static SCHEMA: OnceLock<Schema> = OnceLock::new();
            SCHEMA.get_or_init(|| {
                Schema::new(
                    "Open",
                    vec![FieldSpec::optional_leaf::<String>("note")
                        .outbound("memo")
                        .inbound("comment")],
                )
            })
        }

        fn field(&self, name: &str) -> Option<FieldRef<'_>> {
            (name == "note").then(|| FieldRef::optional_leaf(&self.note))
        }

        fn field_mut(&mut self, name: &str) -> Option<FieldMut<'_>> {
            (name == "note").then(|| FieldMut::optional_leaf(&mut self.note))
        }
    }

    fn paired(
        directives: impl Iterator<Item = (&'static FieldSchema, &'static Policy)>,
    ) -> Vec<(&'static str, &'static str)> {
        directives
            .map(|(field, policy)| (field.name(), policy.paired_name()))
            .collect()
    }

    #[rstest]
    fn views_expose_both_directive_tables() -> Result<()> {
        let mut value = Open::default();
        {
            let read = Inspected::new(&value, "root")?;
            ensure!(paired(read.outbound()) == [("note", "memo")]);
            ensure!(paired(read.inbound()) == [("note", "comment")]);
            ensure!(read.path() == "root");
            ensure!(read.schema().type_name() == "Open");
        }
        let written = InspectedMut::new(&mut value, "root")?;
        ensure!(paired(written.outbound()) == [("note", "memo")]);
        ensure!(paired(written.inbound()) == [("note", "comment")]);
        Ok(())
    }

    #[rstest]
    fn views_report_null_fields() -> Result<()> {
        let mut value = Open::default();
        {
            let empty = Inspected::new(&value, "")?;
            ensure!(empty.is_null("note"));
            ensure!(!empty.is_null("missing"), "absent fields are not null");
            ensure!(empty.has_field("note"));
            ensure!(empty.field("missing").is_none());
        }
        value.note = Some("x".to_owned());
        let populated = Inspected::new(&value, "")?;
        ensure!(!populated.is_null("note"));
        let stored = populated
            .field("note")
            .and_then(|(_, handle)| match handle {
                FieldRef::Leaf(leaf) => leaf.value(),
                FieldRef::Aggregate(_) => None,
            })
            .and_then(|any| any.downcast_ref::<String>());
        ensure!(stored.map(String::as_str) == Some("x"));

        let mut target = Open::default();
        let written = InspectedMut::new(&mut target, "")?;
        ensure!(written.is_null("note"));
        ensure!(written.field("note").is_some());
        Ok(())
    }
}
