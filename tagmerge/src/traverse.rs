//! Depth-first merge traversal shared by both directive directions.
//!
//! The owning side (destination for [`Direction::Outbound`], source for
//! [`Direction::Inbound`]) supplies the directive table; the destination is
//! always the side written. Reported paths use destination field names.

use tracing::{debug, instrument, trace};

use crate::aggregate::{Aggregate, FieldMut, FieldRef};
use crate::directive::{Direction, Policy};
use crate::error::{AggregateFault, MergeError, MergeResult, Side, join_path};
use crate::introspect::{Inspected, InspectedMut};
use crate::options::MergeOptions;
use crate::report::MergeReport;
use crate::schema::FieldSchema;
use crate::setter::set_field;

/// Names of one matched field pair.
struct Pair<'s> {
    dest: &'s str,
    source: &'s str,
    other_side: Side,
}

impl<'s> Pair<'s> {
    fn resolve(direction: Direction, owner: &'s FieldSchema, policy: &'s Policy) -> Self {
        match direction {
            Direction::Outbound => Self {
                dest: owner.name(),
                source: policy.paired_name(),
                other_side: Side::Source,
            },
            Direction::Inbound => Self {
                dest: policy.paired_name(),
                source: owner.name(),
                other_side: Side::Destination,
            },
        }
    }

    /// Name of the field on the side that does not own the directive.
    const fn other_name(&self) -> &'s str {
        match self.other_side {
            Side::Source => self.source,
            Side::Destination => self.dest,
        }
    }
}

/// One merge call: a direction plus the options shared by every frame.
pub(crate) struct Traversal<'o> {
    direction: Direction,
    options: &'o MergeOptions,
}

impl<'o> Traversal<'o> {
    pub(crate) const fn new(direction: Direction, options: &'o MergeOptions) -> Self {
        Self { direction, options }
    }

    /// Merges `source` into `dest`, reached at `path` after `depth` nested
    /// frames.
    #[instrument(
        level = "debug",
        name = "merge_frame",
        skip_all,
        fields(direction = %self.direction, path = path, depth = depth)
    )]
    pub(crate) fn run(
        &self,
        dest: &mut dyn Aggregate,
        source: &dyn Aggregate,
        path: &str,
        depth: usize,
    ) -> MergeResult<MergeReport> {
        if depth > self.options.max_depth() {
            return Err(MergeError::CyclicAggregate {
                path: path.to_owned(),
                limit: self.options.max_depth(),
            });
        }
        let mut written = InspectedMut::new(dest, path)?;
        let read = Inspected::new(source, path)?;
        let directives: Vec<_> = match self.direction {
            Direction::Outbound => written.outbound().collect(),
            Direction::Inbound => read.inbound().collect(),
        };

        let mut report = MergeReport::new();
        for (field, policy) in directives {
            let pair = Pair::resolve(self.direction, field, policy);
            if field.ty().is_aggregate() {
                let nested = self.merge_nested(&mut written, &read, &pair, policy, depth)?;
                report.extend(nested);
            } else if self.merge_leaf(&mut written, &read, &pair, policy)? {
                report.record(join_path(path, pair.dest));
            }
        }
        Ok(report)
    }

    fn other_has_field(
        dest: &InspectedMut<'_>,
        source: &Inspected<'_>,
        pair: &Pair<'_>,
    ) -> bool {
        match pair.other_side {
            Side::Source => source.has_field(pair.source),
            Side::Destination => dest.field_schema(pair.dest).is_some(),
        }
    }

    fn merge_leaf(
        &self,
        dest: &mut InspectedMut<'_>,
        source: &Inspected<'_>,
        pair: &Pair<'_>,
        policy: &Policy,
    ) -> MergeResult<bool> {
        if !Self::other_has_field(dest, source, pair) {
            if policy.tolerate_missing_pair() {
                trace!(field = pair.other_name(), "paired field missing; tolerated");
                return Ok(false);
            }
            return Err(MergeError::PairedFieldMissing {
                side: pair.other_side,
                path: join_path(source.path(), pair.other_name()),
            });
        }
        let Some((schema, value)) = source.field(pair.source) else {
            return Err(MergeError::PairedFieldMissing {
                side: Side::Source,
                path: join_path(source.path(), pair.source),
            });
        };
        match value {
            FieldRef::Leaf(candidate) => set_field(dest, pair.dest, &candidate, policy),
            FieldRef::Aggregate(None) => {
                trace!(field = pair.dest, "source aggregate empty; leaf left untouched");
                Ok(false)
            }
            FieldRef::Aggregate(Some(_)) => {
                Err(self.mismatch(dest, pair, &schema.ty().to_string()))
            }
        }
    }

    fn merge_nested(
        &self,
        dest: &mut InspectedMut<'_>,
        source: &Inspected<'_>,
        pair: &Pair<'_>,
        policy: &Policy,
        depth: usize,
    ) -> MergeResult<MergeReport> {
        let path = join_path(dest.path(), pair.dest);
        if !Self::other_has_field(dest, source, pair) {
            trace!(%path, "paired aggregate missing; skipped");
            return Ok(MergeReport::new());
        }
        if source.is_null(pair.source) {
            trace!(%path, "source value empty; skipped");
            return Ok(MergeReport::new());
        }
        let Some((_, FieldRef::Aggregate(Some(nested_source)))) =
            source.field(pair.source)
        else {
            let source_type = source
                .schema()
                .field(pair.source)
                .map_or_else(|| String::from("<missing>"), |field| field.ty().to_string());
            return Err(self.mismatch(dest, pair, &source_type));
        };

        let Some(dest_schema) = dest.field_schema(pair.dest) else {
            trace!(%path, "destination aggregate missing; skipped");
            return Ok(MergeReport::new());
        };
        let was_null = dest.is_null(pair.dest);
        if !was_null && policy.suppress_overwrite() {
            trace!(%path, "destination aggregate populated; overwrite suppressed");
            return Ok(MergeReport::new());
        }
        if !dest_schema.is_settable() {
            let err = MergeError::FieldNotSettable { path: path.clone() };
            return Err(if was_null {
                MergeError::nested_init(path, err)
            } else {
                err
            });
        }

        let Some(FieldMut::Aggregate(mut slot)) = dest.field_mut(pair.dest) else {
            return Err(MergeError::InvalidAggregate {
                side: Side::Destination,
                fault: AggregateFault::NotAggregate,
                path,
            });
        };
        if was_null {
            slot.materialize()
                .map_err(|cause| MergeError::nested_init(path.clone(), cause))?;
            debug!(%path, "materialised empty nested aggregate");
        }
        let Some(nested_dest) = slot.get_mut() else {
            return Err(MergeError::InvalidAggregate {
                side: Side::Destination,
                fault: AggregateFault::NullReference,
                path,
            });
        };
        self.run(nested_dest, nested_source, &path, depth + 1)
    }

    fn mismatch(&self, dest: &InspectedMut<'_>, pair: &Pair<'_>, source_type: &str) -> MergeError {
        let destination_type = dest
            .field_schema(pair.dest)
            .map_or_else(|| String::from("<missing>"), |field| field.ty().to_string());
        trace!(direction = %self.direction, field = pair.dest, "paired field kinds differ");
        MergeError::TypeMismatch {
            path: join_path(dest.path(), pair.dest),
            destination_type,
            source_type: source_type.to_owned(),
        }
    }
}
