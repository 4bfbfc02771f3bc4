use std::{any::Any, mem};

use arrow::array::Array;
use serde::{Deserialize, Serialize};
use sieve_predicate::{Data, RelationalOperator, Type};

use super::{Synopsis, SynopsisKind};
use crate::error::SynopsisError;

/// Serialized form of a synopsis without a dedicated wire variant.
///
/// Payloads written before `name` and `version` existed decode with an empty
/// name and version 0.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpaquePayload {
    /// Name of the implementation that wrote the blob.
    #[serde(default)]
    pub name: String,
    /// Implementation-defined format version.
    #[serde(default)]
    pub version: u32,
    /// The serialized synopsis.
    pub blob: Vec<u8>,
}

impl OpaquePayload {
    /// Creates a payload.
    #[must_use]
    pub fn new(name: impl Into<String>, version: u32, blob: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            version,
            blob,
        }
    }
}

/// A synopsis whose implementation is not available.
///
/// Keeps the payload so it can be written back unchanged; every lookup is
/// unknown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpaqueSynopsis {
    ty: Type,
    payload: OpaquePayload,
}

impl OpaqueSynopsis {
    /// Wraps `payload` for a column of type `ty`.
    #[must_use]
    pub fn new(ty: Type, payload: OpaquePayload) -> Self {
        Self { ty, payload }
    }

    /// The carried payload.
    #[must_use]
    pub fn payload(&self) -> &OpaquePayload {
        &self.payload
    }
}

impl Synopsis for OpaqueSynopsis {
    fn ty(&self) -> &Type {
        &self.ty
    }

    fn kind(&self) -> SynopsisKind {
        SynopsisKind::Opaque
    }

    fn add(&mut self, array: &dyn Array) -> Result<(), SynopsisError> {
        self.accepts(array)
    }

    fn accepts(&self, _array: &dyn Array) -> Result<(), SynopsisError> {
        Err(SynopsisError::Immutable(self.kind().to_string()))
    }

    fn lookup(&self, _op: RelationalOperator, _literal: &Data) -> Option<bool> {
        None
    }

    fn memusage(&self) -> usize {
        mem::size_of::<Self>() + self.payload.name.capacity() + self.payload.blob.capacity()
    }

    fn opaque_bytes(&self) -> Result<OpaquePayload, SynopsisError> {
        Ok(self.payload.clone())
    }

    fn equals(&self, other: &dyn Synopsis) -> bool {
        other
            .as_any()
            .downcast_ref::<Self>()
            .is_some_and(|other| self == other)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
