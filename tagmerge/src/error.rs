//! Error types produced by merge calls.

use std::fmt;

use thiserror::Error;

use crate::aggregate::MaterializeError;

/// Which of the two aggregates an error refers to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Side {
    /// The aggregate being written.
    Destination,
    /// The aggregate being read.
    Source,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Destination => "destination",
            Self::Source => "source",
        })
    }
}

/// Why a value was rejected as an aggregate.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AggregateFault {
    /// The value is not an aggregate at all.
    NotAggregate,
    /// The value is an empty reference to an aggregate.
    NullReference,
}

impl fmt::Display for AggregateFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotAggregate => "value must be a reference to an aggregate",
            Self::NullReference => "value must be a reference to a non-empty aggregate",
        })
    }
}

/// Errors that abort a merge call.
///
/// Every variant records the dotted path at which it was raised; an empty
/// path denotes the root aggregates.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MergeError {
    /// One of the aggregates handed to a merge frame is unusable.
    #[error("invalid value of {side} object: {fault} (on path: {path:?})")]
    InvalidAggregate {
        /// Side that supplied the value.
        side: Side,
        /// What is wrong with it.
        fault: AggregateFault,
        /// Dotted path of the merge frame.
        path: String,
    },

    /// A field that must be written is declared read-only.
    #[error("field {path:?} is not settable")]
    FieldNotSettable {
        /// Dotted path of the field.
        path: String,
    },

    /// The value setter was pointed at a destination field that does not
    /// exist.
    #[error("destination field {path:?} not found")]
    FieldNotFound {
        /// Dotted path of the missing field.
        path: String,
    },

    /// A leaf directive names a field that the other aggregate lacks.
    #[error("{side} field {path:?} does not exist")]
    PairedFieldMissing {
        /// Side expected to hold the field.
        side: Side,
        /// Dotted path of the missing field.
        path: String,
    },

    /// Paired fields hold incompatible types.
    #[error("types not assignable for {path:?}: destination {destination_type}, source {source_type}")]
    TypeMismatch {
        /// Dotted path of the destination field.
        path: String,
        /// Declared type of the destination field.
        destination_type: String,
        /// Declared type of the source field.
        source_type: String,
    },

    /// The source exposes a value that cannot be copied into the destination.
    #[error("cannot take an owned copy of the source value for {path:?}")]
    NotAddressable {
        /// Dotted path of the destination field.
        path: String,
    },

    /// An empty nested destination could not be initialised before recursion.
    #[error("creating empty value for {path:?}: {source}")]
    NestedInitFailure {
        /// Dotted path of the nested field.
        path: String,
        /// Underlying failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Nesting exceeded the configured depth limit.
    #[error("aggregate nesting at {path:?} exceeds the depth limit of {limit}")]
    CyclicAggregate {
        /// Dotted path of the frame that crossed the limit.
        path: String,
        /// Configured maximum depth.
        limit: usize,
    },
}

impl MergeError {
    /// Dotted path at which the error was raised.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::InvalidAggregate { path, .. }
            | Self::FieldNotSettable { path }
            | Self::FieldNotFound { path }
            | Self::PairedFieldMissing { path, .. }
            | Self::TypeMismatch { path, .. }
            | Self::NotAddressable { path }
            | Self::NestedInitFailure { path, .. }
            | Self::CyclicAggregate { path, .. } => path,
        }
    }

    pub(crate) fn nested_init(path: String, source: impl Into<NestedCause>) -> Self {
        Self::NestedInitFailure {
            path,
            source: source.into().0,
        }
    }
}

/// Boxed cause of a [`MergeError::NestedInitFailure`].
pub(crate) struct NestedCause(Box<dyn std::error::Error + Send + Sync>);

impl From<MaterializeError> for NestedCause {
    fn from(value: MaterializeError) -> Self {
        Self(Box::new(value))
    }
}

impl From<MergeError> for NestedCause {
    fn from(value: MergeError) -> Self {
        Self(Box::new(value))
    }
}

/// Result alias used throughout the crate.
pub type MergeResult<T> = Result<T, MergeError>;

/// Joins a parent path and a field name with `.`.
pub(crate) fn join_path(parent: &str, field: &str) -> String {
    if parent.is_empty() {
        field.to_owned()
    } else {
        format!("{parent}.{field}")
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for error rendering and path helpers.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "city", "city")]
    #[case("address", "city", "address.city")]
    #[case("a.b", "c", "a.b.c")]
    fn joins_paths(#[case] parent: &str, #[case] field: &str, #[case] expected: &str) {
        assert_eq!(join_path(parent, field), expected);
    }

    #[rstest]
    fn nested_failure_keeps_cause() {
        let cause = MergeError::FieldNotSettable {
            path: "address".to_owned(),
        };
        let err = MergeError::nested_init("address".to_owned(), cause);
        assert_eq!(err.path(), "address");
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(
            source.as_deref(),
            Some("field \"address\" is not settable")
        );
    }

    #[rstest]
    fn type_mismatch_names_both_types() {
        let err = MergeError::TypeMismatch {
            path: "port".to_owned(),
            destination_type: "u16".to_owned(),
            source_type: "Option<u32>".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "types not assignable for \"port\": destination u16, source Option<u32>"
        );
    }
}
