//! Wire form of a single synopsis.

use serde::{Deserialize, Serialize};

use super::{
    BoolSynopsis, OpaquePayload, QualifiedRecordField, Synopsis, SynopsisFactory, SynopsisKind,
    TimeSynopsis,
};
use crate::error::SynopsisError;

/// Wire form of a [`BoolSynopsis`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoolPayload {
    /// A `true` was seen.
    pub any_true: bool,
    /// A `false` was seen.
    pub any_false: bool,
}

/// Wire form of a [`TimeSynopsis`], in nanoseconds since the epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePayload {
    /// Smallest value.
    pub min: i64,
    /// Largest value.
    pub max: i64,
}

/// A synopsis together with the field it summarizes.
///
/// Exactly one payload is set when packed. Decoding takes the first present
/// payload in the order bool, time, opaque.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynopsisRecord {
    /// The summarized field.
    pub qualified_field: QualifiedRecordField,
    /// Payload of a bool synopsis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bool_synopsis: Option<BoolPayload>,
    /// Payload of a time synopsis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_synopsis: Option<TimePayload>,
    /// Payload of any other synopsis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opaque_synopsis: Option<OpaquePayload>,
}

impl SynopsisRecord {
    /// Packs `synopsis` into its wire form.
    pub fn pack(
        qualified_field: QualifiedRecordField,
        synopsis: &dyn Synopsis,
    ) -> Result<Self, SynopsisError> {
        let mut record = Self {
            qualified_field,
            bool_synopsis: None,
            time_synopsis: None,
            opaque_synopsis: None,
        };
        let any = synopsis.as_any();
        match synopsis.kind() {
            SynopsisKind::Bool if any.is::<BoolSynopsis>() => {
                let bool_synopsis = any.downcast_ref::<BoolSynopsis>();
                record.bool_synopsis = bool_synopsis.map(|s| BoolPayload {
                    any_true: s.any_true(),
                    any_false: s.any_false(),
                });
            }
            SynopsisKind::Time if any.is::<TimeSynopsis>() => {
                let time_synopsis = any.downcast_ref::<TimeSynopsis>();
                record.time_synopsis = time_synopsis.map(|s| TimePayload {
                    min: s.min(),
                    max: s.max(),
                });
            }
            _ => record.opaque_synopsis = Some(synopsis.opaque_bytes()?),
        }
        Ok(record)
    }

    /// Restores the synopsis, decoding opaque payloads through `factory`.
    pub fn unpack(
        self,
        factory: &SynopsisFactory,
    ) -> Result<(QualifiedRecordField, Box<dyn Synopsis>), SynopsisError> {
        let ty = self.qualified_field.ty.clone();
        let synopsis: Box<dyn Synopsis> = if let Some(payload) = self.bool_synopsis {
            Box::new(BoolSynopsis::from_flags(ty, payload.any_true, payload.any_false))
        } else if let Some(payload) = self.time_synopsis {
            Box::new(TimeSynopsis::from_range(ty, payload.min, payload.max))
        } else if let Some(payload) = self.opaque_synopsis {
            factory.decode_opaque(ty, payload)
        } else {
            return Err(SynopsisError::NoSynopsisType);
        };
        Ok((self.qualified_field, synopsis))
    }

    /// Encodes the record as JSON.
    pub fn encode(&self) -> Result<Vec<u8>, SynopsisError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes a record from JSON.
    pub fn decode(bytes: &[u8]) -> Result<Self, SynopsisError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
