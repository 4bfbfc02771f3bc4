//! Per-column summaries that can rule out a partition without reading it.
//!
//! A [`Synopsis`] summarizes one column of one schema. Lookups answer
//! `Some(false)` only when no summarized value can satisfy the predicate;
//! `None` means the synopsis cannot tell.

mod boolean;
mod codec;
mod factory;
mod opaque;
mod partition;
mod time;

use std::{any::Any, fmt};

use arrow::array::Array;
use serde::{Deserialize, Serialize};
use sieve_predicate::{Data, Offset, RelationalOperator, Schema, Type};

pub use self::{
    boolean::BoolSynopsis,
    codec::{BoolPayload, SynopsisRecord, TimePayload},
    factory::{OpaqueDecoder, SynopsisConstructor, SynopsisFactory},
    opaque::{OpaquePayload, OpaqueSynopsis},
    partition::{
        partition_might_match, synopsis_might_match, PartitionSynopsis, PartitionSynopsisBuilder,
    },
    time::TimeSynopsis,
};
use crate::error::SynopsisError;

/// Kind of a synopsis, as used on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SynopsisKind {
    /// [`BoolSynopsis`].
    Bool,
    /// [`TimeSynopsis`].
    Time,
    /// Anything carried as an opaque blob.
    Opaque,
}

impl SynopsisKind {
    /// Wire name of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SynopsisKind::Bool => "bool",
            SynopsisKind::Time => "time",
            SynopsisKind::Opaque => "opaque",
        }
    }
}

impl fmt::Display for SynopsisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of the values of one column.
pub trait Synopsis: fmt::Debug + Send + Sync {
    /// Type of the summarized column.
    fn ty(&self) -> &Type;

    /// Kind used to pick the wire representation.
    fn kind(&self) -> SynopsisKind;

    /// Folds every non-null value of `array` into the summary.
    fn add(&mut self, array: &dyn Array) -> Result<(), SynopsisError>;

    /// Fails if [`Synopsis::add`] would reject `array`. Changes nothing.
    fn accepts(&self, _array: &dyn Array) -> Result<(), SynopsisError> {
        Ok(())
    }

    /// Tests `x op literal` for every summarized `x`.
    ///
    /// `Some(false)` rules the column out; `Some(true)` means a value
    /// definitely matches; `None` means unknown.
    fn lookup(&self, op: RelationalOperator, literal: &Data) -> Option<bool>;

    /// Approximate heap and inline size in bytes.
    fn memusage(&self) -> usize;

    /// A cheaper approximation, if this synopsis has one.
    fn shrink(&self) -> Option<Box<dyn Synopsis>> {
        None
    }

    /// Serialized form for synopses without a dedicated wire variant.
    fn opaque_bytes(&self) -> Result<OpaquePayload, SynopsisError> {
        Err(SynopsisError::Unserializable(self.kind().to_string()))
    }

    /// Structural equality across trait objects.
    fn equals(&self, other: &dyn Synopsis) -> bool;

    /// Downcasting support.
    fn as_any(&self) -> &dyn Any;
}

impl PartialEq for dyn Synopsis {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

/// Identity of a field within a schema; the key of a stored synopsis.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QualifiedRecordField {
    /// Schema name.
    pub schema: String,
    /// Schema fingerprint.
    pub fingerprint: String,
    /// Position of the field.
    pub offset: Offset,
    /// Dotted key of the field, without the schema name.
    pub field: String,
    /// Type of the field.
    pub ty: Type,
}

impl QualifiedRecordField {
    /// Identity of the field at `offset`; `None` if the offset is invalid.
    #[must_use]
    pub fn new(schema: &Schema, offset: &Offset) -> Option<Self> {
        let leaf = schema
            .leaves()
            .into_iter()
            .find(|leaf| leaf.offset == *offset)?;
        Some(Self {
            schema: schema.name().to_string(),
            fingerprint: schema.fingerprint().to_string(),
            offset: offset.clone(),
            field: leaf.key,
            ty: leaf.field.ty.clone(),
        })
    }

    /// Returns true if this identity belongs to `schema`.
    #[must_use]
    pub fn belongs_to(&self, schema: &Schema) -> bool {
        self.fingerprint == schema.fingerprint()
    }
}

impl fmt::Display for QualifiedRecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.field)
    }
}
