use std::{any::Any, mem};

use arrow::{
    array::{Array, AsArray},
    compute::{max, min},
    datatypes::TimestampNanosecondType,
};
use sieve_predicate::{Data, RelationalOperator, Type};

use super::{Synopsis, SynopsisKind};
use crate::error::SynopsisError;

/// Minimum and maximum of a `time` column, in nanoseconds since the epoch.
///
/// An empty synopsis has `min > max` and rules out `==` and every ordering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeSynopsis {
    ty: Type,
    min: i64,
    max: i64,
}

impl TimeSynopsis {
    /// An empty synopsis for a column of type `ty`.
    #[must_use]
    pub fn new(ty: Type) -> Self {
        Self::from_range(ty, i64::MAX, i64::MIN)
    }

    /// A synopsis covering `[min, max]`.
    #[must_use]
    pub fn from_range(ty: Type, min: i64, max: i64) -> Self {
        Self { ty, min, max }
    }

    /// Smallest summarized value.
    #[must_use]
    pub fn min(&self) -> i64 {
        self.min
    }

    /// Largest summarized value.
    #[must_use]
    pub fn max(&self) -> i64 {
        self.max
    }

    fn lookup_time(&self, op: RelationalOperator, x: i64) -> Option<bool> {
        match op {
            RelationalOperator::Equal => Some(self.min <= x && x <= self.max),
            RelationalOperator::NotEqual => Some(!(self.min == x && self.max == x)),
            RelationalOperator::Less => Some(self.min < x),
            RelationalOperator::LessEqual => Some(self.min <= x),
            RelationalOperator::Greater => Some(self.max > x),
            RelationalOperator::GreaterEqual => Some(self.max >= x),
            _ => None,
        }
    }
}

impl Synopsis for TimeSynopsis {
    fn ty(&self) -> &Type {
        &self.ty
    }

    fn kind(&self) -> SynopsisKind {
        SynopsisKind::Time
    }

    fn add(&mut self, array: &dyn Array) -> Result<(), SynopsisError> {
        let Some(values) = array.as_primitive_opt::<TimestampNanosecondType>() else {
            return self.accepts(array);
        };
        if let Some(low) = min(values) {
            self.min = self.min.min(low);
        }
        if let Some(high) = max(values) {
            self.max = self.max.max(high);
        }
        Ok(())
    }

    fn accepts(&self, array: &dyn Array) -> Result<(), SynopsisError> {
        match array.as_primitive_opt::<TimestampNanosecondType>() {
            Some(_) => Ok(()),
            None => Err(SynopsisError::ColumnType {
                expected: self.ty.to_string(),
                actual: array.data_type().to_string(),
            }),
        }
    }

    fn lookup(&self, op: RelationalOperator, literal: &Data) -> Option<bool> {
        match (op, literal) {
            (_, Data::Time(x)) => self.lookup_time(op, *x),
            (RelationalOperator::In, Data::List(items)) => {
                let mut any = false;
                for item in items {
                    let Data::Time(x) = item else {
                        return None;
                    };
                    any |= self.lookup_time(RelationalOperator::Equal, *x)?;
                }
                Some(any)
            }
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
