//! Directive-driven merging of one struct into another.
//!
//! `tagmerge` copies a chosen subset of fields from a source aggregate into a
//! destination aggregate. Each field opts in through a directive naming the
//! field it pairs with and how the pair behaves:
//!
//! - `from` directives live on the destination and name source fields; they
//!   drive [`merge_by_destination`];
//! - `into` directives live on the source and name destination fields; they
//!   drive [`merge_by_source`].
//!
//! A directive reads `[paired_name][,nooverwrite][,omitmissing]`. The paired
//! name defaults to the field's own name, `nooverwrite` keeps populated
//! destination values, and `omitmissing` tolerates an absent paired field.
//! Empty (`None`) source values never overwrite anything, and `T` and
//! `Option<T>` fields pair with each other freely. Fields marked `nested`
//! are merged recursively instead of being copied.
//!
//! Values are cloned, so `#[derive(Aggregate)]` requires `Clone` on every
//! visible leaf field. Mark a field `#[merge(skip)]` to hide it, or
//! `#[merge(view)]` to expose a non-`Clone` value that can be written but not
//! copied ([`MergeError::NotAddressable`]). Empty `Option` nested fields are
//! filled with `T::default()` before merging into them.
//!
//! ```rust
//! use tagmerge::{Aggregate, merge_by_destination};
//!
//! #[derive(Aggregate, Debug, Default, PartialEq)]
//! struct Account {
//!     #[merge(from = "")]
//!     name: String,
//!     #[merge(from = "port_override,nooverwrite")]
//!     port: Option<u16>,
//!     #[merge(from = ",nooverwrite")]
//!     retries: Option<u8>,
//! }
//!
//! #[derive(Aggregate, Default)]
//! struct AccountPatch {
//!     name: Option<String>,
//!     port_override: u16,
//!     retries: u8,
//! }
//!
//! let mut account = Account {
//!     name: "original".into(),
//!     port: Some(42),
//!     retries: None,
//! };
//! let patch = AccountPatch {
//!     name: Some("renamed".into()),
//!     port_override: 43,
//!     retries: 3,
//! };
//!
//! let report = merge_by_destination(&mut account, &patch)?;
//! assert_eq!(account.name, "renamed");
//! assert_eq!(account.port, Some(42));
//! assert_eq!(account.retries, Some(3));
//! assert_eq!(report.sorted(), ["name", "retries"]);
//! # Ok::<_, tagmerge::MergeError>(())
//! ```

extern crate self as tagmerge;

pub use tagmerge_macros::Aggregate;

mod aggregate;
mod directive;
mod error;
mod introspect;
mod options;
mod report;
mod schema;
mod setter;
mod traverse;

pub use aggregate::{
    Aggregate, AggregateSlot, FieldMut, FieldRef, LeafRef, LeafSlot, MaterializeError,
    StoreRejected,
};
pub use directive::{Direction, Policy};
pub use error::{AggregateFault, MergeError, MergeResult, Side};
pub use introspect::{Inspected, InspectedMut};
pub use options::{DEFAULT_MAX_DEPTH, MergeOptions};
pub use report::MergeReport;
pub use schema::{FieldKind, FieldSchema, FieldSpec, FieldType, Schema, Shape, ValueType};
pub use setter::set_field;

use tracing::{debug, instrument};

use traverse::Traversal;

/// Runs merges with a fixed set of [`MergeOptions`].
///
/// # Examples
///
/// ```rust
/// use tagmerge::{Aggregate, MergeOptions, Merger};
///
/// #[derive(Aggregate, Default)]
/// struct Settings {
///     #[merge(from = "", into = "")]
///     level: Option<u8>,
/// }
///
/// let merger = Merger::new(MergeOptions::default().with_max_depth(2));
/// let mut current = Settings::default();
/// let incoming = Settings { level: Some(3) };
/// let report = merger.by_source(&mut current, &incoming)?;
/// assert!(report.contains("level"));
/// assert_eq!(current.level, Some(3));
/// # Ok::<_, tagmerge::MergeError>(())
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Merger {
    options: MergeOptions,
}

impl Merger {
    /// Builds a merger applying `options` to every call.
    #[must_use]
    pub const fn new(options: MergeOptions) -> Self {
        Self { options }
    }

    /// Options applied to every call.
    #[must_use]
    pub const fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Merges `source` into `dest` using the directive table selected by
    /// `direction` for the whole call tree.
    ///
    /// # Errors
    ///
    /// Returns the first [`MergeError`] raised at any depth. Fields written
    /// before the failure keep their new values.
    #[instrument(
        level = "debug",
        skip_all,
        fields(
            direction = %direction,
            destination = dest.schema().type_name(),
            source = source.schema().type_name(),
        )
    )]
    pub fn merge(
        &self,
        direction: Direction,
        dest: &mut dyn Aggregate,
        source: &dyn Aggregate,
    ) -> MergeResult<MergeReport> {
        let report = Traversal::new(direction, &self.options).run(dest, source, "", 0)?;
        debug!(modified = report.len(), "merge complete");
        Ok(report)
    }

    /// Merge driven by `from` directives on the destination.
    ///
    /// # Errors
    ///
    /// See [`Merger::merge`].
    pub fn by_destination<D, S>(&self, dest: &mut D, source: &S) -> MergeResult<MergeReport>
    where
        D: Aggregate,
        S: Aggregate,
    {
        self.merge(Direction::Outbound, dest, source)
    }

    /// Merge driven by `into` directives on the source.
    ///
    /// # Errors
    ///
    /// See [`Merger::merge`].
    pub fn by_source<D, S>(&self, dest: &mut D, source: &S) -> MergeResult<MergeReport>
    where
        D: Aggregate,
        S: Aggregate,
    {
        self.merge(Direction::Inbound, dest, source)
    }
}

/// Copies fields from `source` into `dest` as directed by the `from`
/// directives declared on the destination type.
///
/// Returns the dotted paths of every destination field written.
///
/// # Errors
///
/// Returns the first [`MergeError`] raised at any depth. Fields written
/// before the failure keep their new values.
pub fn merge_by_destination<D, S>(dest: &mut D, source: &S) -> MergeResult<MergeReport>
where
    D: Aggregate,
    S: Aggregate,
{
    Merger::default().by_destination(dest, source)
}

/// Copies fields from `source` into `dest` as directed by the `into`
/// directives declared on the source type.
///
/// Returns the dotted paths of every destination field written.
///
/// # Errors
///
/// Returns the first [`MergeError`] raised at any depth. Fields written
/// before the failure keep their new values.
pub fn merge_by_source<D, S>(dest: &mut D, source: &S) -> MergeResult<MergeReport>
where
    D: Aggregate,
    S: Aggregate,
{
    Merger::default().by_source(dest, source)
}
