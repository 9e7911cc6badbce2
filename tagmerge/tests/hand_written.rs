//! Merges involving hand-written `Aggregate` implementations.

use std::error::Error as _;
use std::sync::OnceLock;

use anyhow::{Result, anyhow, ensure};
use rstest::rstest;
use tagmerge::{
    Aggregate, AggregateFault, AggregateSlot, FieldMut, FieldRef, FieldSpec, LeafRef,
    MaterializeError, MergeError, Schema, Shape, Side, merge_by_destination,
};

#[derive(Aggregate, Debug, Default)]
struct Session {
    #[merge(from = "")]
    token: Option<String>,
}

/// Exposes its token as a borrowed view only.
struct Borrowed {
    token: String,
}

impl Aggregate for Borrowed {
    fn schema(&self) -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| Schema::new("Borrowed", vec![FieldSpec::leaf::<String>("token")]))
    }

    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        (name == "token").then(|| FieldRef::Leaf(LeafRef::view(&self.token)))
    }

    fn field_mut(&mut self, name: &str) -> Option<FieldMut<'_>> {
        (name == "token").then(|| FieldMut::leaf(&mut self.token))
    }
}

#[rstest]
fn borrowed_views_cannot_be_copied() -> Result<()> {
    let mut session = Session::default();
    let source = Borrowed {
        token: String::from("abc"),
    };
    let err = merge_by_destination(&mut session, &source)
        .err()
        .ok_or_else(|| anyhow!("expected borrowed view to be rejected"))?;
    ensure!(
        matches!(&err, MergeError::NotAddressable { path } if path == "token"),
        "unexpected error {err:?}"
    );
    ensure!(session.token.is_none());
    Ok(())
}

/// Owns a handle that cannot be cloned.
#[derive(Debug, Default)]
struct Ticket(u64);

#[derive(Aggregate, Debug, Default)]
struct Counter {
    #[merge(from = "", view)]
    ticket: Option<Ticket>,
}

#[derive(Aggregate, Debug, Default)]
struct Dispenser {
    #[merge(view)]
    ticket: Ticket,
}

#[rstest]
fn derived_views_cannot_be_copied() -> Result<()> {
    let mut counter = Counter::default();
    let err = merge_by_destination(&mut counter, &Dispenser { ticket: Ticket(7) })
        .err()
        .ok_or_else(|| anyhow!("expected derived view to be rejected"))?;
    ensure!(
        matches!(&err, MergeError::NotAddressable { path } if path == "ticket"),
        "unexpected error {err:?}"
    );
    ensure!(counter.ticket.is_none());
    Ok(())
}

#[derive(Aggregate, Clone, Debug, Default)]
struct Inner {
    #[merge(from = "")]
    level: Option<u8>,
}

#[derive(Aggregate, Clone, Debug, Default)]
struct Outer {
    #[merge(nested)]
    inner: Option<Inner>,
}

/// Declares a nested field but never hands out a writable handle to it.
#[derive(Default)]
struct Opaque {
    inner: Option<Inner>,
}

impl Aggregate for Opaque {
    fn schema(&self) -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::new(
                "Opaque",
                vec![FieldSpec::nested::<Inner>("inner", Shape::Optional).outbound("")],
            )
        })
    }

    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        (name == "inner").then(|| FieldRef::optional_nested(&self.inner))
    }

    fn field_mut(&mut self, _name: &str) -> Option<FieldMut<'_>> {
        None
    }
}

#[rstest]
fn unreachable_nested_destinations_are_invalid() -> Result<()> {
    let mut dest = Opaque::default();
    let source = Outer {
        inner: Some(Inner { level: Some(3) }),
    };
    let err = merge_by_destination(&mut dest, &source)
        .err()
        .ok_or_else(|| anyhow!("expected invalid aggregate"))?;
    ensure!(
        matches!(
            &err,
            MergeError::InvalidAggregate {
                side: Side::Destination,
                fault: AggregateFault::NotAggregate,
                path,
            } if path == "inner"
        ),
        "unexpected error {err:?}"
    );
    Ok(())
}

#[derive(Aggregate, Debug, Default)]
struct Pulling {
    #[merge(from = "", nested)]
    inner: Option<Inner>,
}

#[rstest]
fn hand_written_sources_feed_derived_destinations() -> Result<()> {
    let mut dest = Pulling::default();
    let source = Opaque {
        inner: Some(Inner { level: Some(9) }),
    };
    let report = merge_by_destination(&mut dest, &source)?;
    ensure!(report.sorted() == ["inner.level"], "unexpected report {report}");
    ensure!(dest.inner.and_then(|inner| inner.level) == Some(9));
    Ok(())
}

/// Nested slot backed by storage that may refuse to allocate.
struct ArenaSlot {
    exhausted: bool,
}

impl AggregateSlot for ArenaSlot {
    fn is_null(&self) -> bool {
        true
    }

    fn materialize(&mut self) -> Result<(), MaterializeError> {
        if self.exhausted {
            return Err(MaterializeError(String::from("arena exhausted")));
        }
        Ok(())
    }

    fn get_mut(&mut self) -> Option<&mut dyn Aggregate> {
        None
    }
}

/// Nested aggregate stored outside the struct.
struct Arena {
    exhausted: bool,
}

impl Aggregate for Arena {
    fn schema(&self) -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::new(
                "Arena",
                vec![FieldSpec::nested::<Inner>("inner", Shape::Optional).outbound("")],
            )
        })
    }

    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        (name == "inner").then_some(FieldRef::Aggregate(None))
    }

    fn field_mut(&mut self, name: &str) -> Option<FieldMut<'_>> {
        (name == "inner").then(|| {
            FieldMut::Aggregate(Box::new(ArenaSlot {
                exhausted: self.exhausted,
            }))
        })
    }
}

fn filled_outer() -> Outer {
    Outer {
        inner: Some(Inner { level: Some(1) }),
    }
}

#[rstest]
fn materialisation_failures_are_wrapped() -> Result<()> {
    let mut dest = Arena { exhausted: true };
    let err = merge_by_destination(&mut dest, &filled_outer())
        .err()
        .ok_or_else(|| anyhow!("expected materialisation to fail"))?;
    ensure!(
        matches!(&err, MergeError::NestedInitFailure { path, .. } if path == "inner"),
        "unexpected error {err:?}"
    );
    let cause = err
        .source()
        .ok_or_else(|| anyhow!("nested failure lost its cause"))?;
    ensure!(cause.to_string() == "arena exhausted", "cause was {cause}");
    Ok(())
}

#[rstest]
fn slots_left_empty_after_materialisation_are_null_references() -> Result<()> {
    let mut dest = Arena { exhausted: false };
    let err = merge_by_destination(&mut dest, &filled_outer())
        .err()
        .ok_or_else(|| anyhow!("expected null reference"))?;
    ensure!(
        matches!(
            &err,
            MergeError::InvalidAggregate {
                side: Side::Destination,
                fault: AggregateFault::NullReference,
                path,
            } if path == "inner"
        ),
        "unexpected error {err:?}"
    );
    Ok(())
}
