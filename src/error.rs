use arrow::error::ArrowError;
use sieve_predicate::{Offset, SyntaxError};
use thiserror::Error;

/// Failure to bind an expression to a concrete schema.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// Both operands of a predicate are extractors.
    #[error("cannot resolve predicate without a literal operand: {0}")]
    UnsupportedPredicate(String),
    /// A data extractor bound to another schema was found.
    #[error("data extractor bound to schema '{actual}' cannot be resolved against '{expected}'")]
    ForeignExtractor {
        /// Schema the expression is resolved against.
        expected: String,
        /// Schema the extractor is bound to.
        actual: String,
    },
}

/// Failure to resolve a dotted selector path.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectorError {
    /// The selector has no segments or contains an empty segment.
    #[error("invalid selector '{0}'")]
    Invalid(String),
    /// A path segment tried to descend into a non-record type.
    #[error("field access on non-record: '{field}' on type {actual}")]
    FieldOfNonRecord {
        /// Segment that could not be applied.
        field: String,
        /// Type that was accessed.
        actual: String,
    },
    /// A path segment does not exist at the current level.
    #[error("field not found: '{field}' in '{path}'")]
    FieldNotFound {
        /// Missing segment.
        field: String,
        /// The full selector.
        path: String,
    },
}

/// Failure to build or read a table slice.
#[derive(Debug, Error)]
pub enum SliceError {
    /// The Arrow batch does not have the layout of the declared schema.
    #[error("batch layout does not match schema '{schema}': {reason}")]
    SchemaMismatch {
        /// Declared schema.
        schema: String,
        /// What differs.
        reason: String,
    },
    /// The offset does not address a column in this slice.
    #[error("no column at offset {0}")]
    InvalidOffset(Offset),
    /// Arrow failure while assembling columns.
    #[error(transparent)]
    Arrow(#[from] ArrowError),
}

/// Failure to build, encode or decode synopses.
#[derive(Debug, Error)]
pub enum SynopsisError {
    /// A wire record carries none of the known synopsis payloads.
    #[error("no synopsis type")]
    NoSynopsisType,
    /// The synopsis cannot be represented on the wire.
    #[error("synopsis of kind {0} cannot be serialized")]
    Unserializable(String),
    /// Input column does not have the type the synopsis was built for.
    #[error("synopsis for {expected} cannot summarize a column of type {actual}")]
    ColumnType {
        /// Type the synopsis summarizes.
        expected: String,
        /// Arrow type of the rejected column.
        actual: String,
    },
    /// The synopsis does not accept new values.
    #[error("synopsis of kind {0} is immutable")]
    Immutable(String),
    /// A slice of a different schema was added to a partition synopsis.
    #[error("partition synopsis for '{expected}' cannot summarize schema '{actual}'")]
    SchemaMismatch {
        /// Schema of the partition.
        expected: String,
        /// Schema of the rejected slice.
        actual: String,
    },
    /// A synopsis is attached to an offset that is not a leaf of the schema.
    #[error("schema '{schema}' has no leaf at offset {offset}")]
    UnknownOffset {
        /// Schema of the partition.
        schema: String,
        /// Offset of the synopsis.
        offset: String,
    },
    /// The encoded schema is not a named record.
    #[error("encoded schema is not a named record type")]
    InvalidSchema,
    /// Column access failed.
    #[error(transparent)]
    Slice(#[from] SliceError),
    /// JSON encoding or decoding failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Aggregate error of the public sieve operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The expression is semantically invalid.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    /// The expression cannot be bound to a schema.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// A selector path is invalid.
    #[error(transparent)]
    Selector(#[from] SelectorError),
    /// A table slice is malformed.
    #[error(transparent)]
    Slice(#[from] SliceError),
    /// A synopsis operation failed.
    #[error(transparent)]
    Synopsis(#[from] SynopsisError),
}

/// Marker returned once an error diagnostic has been emitted.
///
/// The diagnostic itself went to the handler; this only tells the caller to stop.
#[derive(Debug, Clone, Copy, Default, Error, PartialEq, Eq)]
#[error("evaluation failed; see emitted diagnostics")]
pub struct Failure;
