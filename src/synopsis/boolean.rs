use std::{any::Any, mem};

use arrow::array::{Array, AsArray};
use sieve_predicate::{Data, RelationalOperator, Type};

use super::{Synopsis, SynopsisKind};
use crate::error::SynopsisError;

/// Remembers whether a `bool` column held any `true` and any `false`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoolSynopsis {
    ty: Type,
    any_true: bool,
    any_false: bool,
}

impl BoolSynopsis {
    /// An empty synopsis for a column of type `ty`.
    #[must_use]
    pub fn new(ty: Type) -> Self {
        Self::from_flags(ty, false, false)
    }

    /// A synopsis with the given flags.
    #[must_use]
    pub fn from_flags(ty: Type, any_true: bool, any_false: bool) -> Self {
        Self {
            ty,
            any_true,
            any_false,
        }
    }

    /// Whether a `true` was seen.
    #[must_use]
    pub fn any_true(&self) -> bool {
        self.any_true
    }

    /// Whether a `false` was seen.
    #[must_use]
    pub fn any_false(&self) -> bool {
        self.any_false
    }
}

impl Synopsis for BoolSynopsis {
    fn ty(&self) -> &Type {
        &self.ty
    }

    fn kind(&self) -> SynopsisKind {
        SynopsisKind::Bool
    }

    fn add(&mut self, array: &dyn Array) -> Result<(), SynopsisError> {
        let Some(values) = array.as_boolean_opt() else {
            return self.accepts(array);
        };
        for value in values.iter().flatten() {
            if value {
                self.any_true = true;
            } else {
                self.any_false = true;
            }
            if self.any_true && self.any_false {
                break;
            }
        }
        Ok(())
    }

    fn accepts(&self, array: &dyn Array) -> Result<(), SynopsisError> {
        match array.as_boolean_opt() {
            Some(_) => Ok(()),
            None => Err(SynopsisError::ColumnType {
                expected: self.ty.to_string(),
                actual: array.data_type().to_string(),
            }),
        }
    }

    fn lookup(&self, op: RelationalOperator, literal: &Data) -> Option<bool> {
        let Data::Bool(value) = literal else {
            return None;
        };
        let seen = if *value { self.any_true } else { self.any_false };
        let other = if *value { self.any_false } else { self.any_true };
        match op {
            RelationalOperator::Equal => Some(seen),
            RelationalOperator::NotEqual => Some(other),
            _ => None,
        }
    }

    fn memusage(&self) -> usize {
        mem::size_of::<Self>()
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
