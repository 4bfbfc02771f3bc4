//! Exact dotted-path selectors.
//!
//! Unlike field extractors, a selector names one field exactly: every segment
//! must exist at its level and no suffix matching takes place.

use std::{fmt, str::FromStr};

use arrow::array::{new_null_array, Array, ArrayRef};
use sieve_predicate::{Offset, Type};

use crate::{
    diagnostics::{Diagnostic, DiagnosticHandler},
    error::SelectorError,
    slice::TableSlice,
};

/// A dotted path from a record root to one field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Selector {
    path: Vec<String>,
}

impl Selector {
    /// Creates a selector from its segments.
    pub fn new<I, S>(segments: I) -> Result<Self, SelectorError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let path: Vec<String> = segments.into_iter().map(Into::into).collect();
        if path.is_empty() || path.iter().any(String::is_empty) {
            return Err(SelectorError::Invalid(path.join(".")));
        }
        Ok(Self { path })
    }

    /// Path segments.
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.split('.'))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path.join("."))
    }
}

/// A column together with the type it was read as.
#[derive(Clone, Debug)]
pub struct Series {
    /// Logical type of the column.
    pub ty: Type,
    /// Column data.
    pub array: ArrayRef,
}

impl Series {
    /// A column of `rows` nulls.
    #[must_use]
    pub fn null(rows: usize) -> Self {
        let ty = Type::null();
        let array = new_null_array(&ty.to_arrow(), rows);
        Self { ty, array }
    }

    /// Number of null cells, including those of an untyped null column.
    #[must_use]
    pub fn null_count(&self) -> usize {
        self.array.logical_null_count()
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.array.len()
    }

    /// Whether the series has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }
}

/// Walks `ty` level by level and returns the offset `selector` names.
pub fn resolve_selector(selector: &Selector, ty: &Type) -> Result<Offset, SelectorError> {
    let mut offset = Offset::root();
    let mut current = ty;
    for segment in &selector.path {
        let Some(fields) = current.fields() else {
            return Err(SelectorError::FieldOfNonRecord {
                field: segment.clone(),
                actual: current.to_string(),
            });
        };
        let Some(index) = fields.iter().position(|field| field.name == *segment) else {
            return Err(SelectorError::FieldNotFound {
                field: segment.clone(),
                path: selector.to_string(),
            });
        };
        offset.push(index);
        current = &fields[index].ty;
    }
    Ok(offset)
}

/// Reads the column `selector` names from `slice`.
///
/// An unresolvable path emits a warning and yields a null column.
pub fn eval_selector(
    selector: &Selector,
    slice: &TableSlice,
    dh: &mut dyn DiagnosticHandler,
) -> Series {
    let offset = match resolve_selector(selector, slice.schema().as_type()) {
        Ok(offset) => offset,
        Err(err) => {
            dh.emit(
                Diagnostic::warning(err.to_string())
                    .note(format!("schema is '{}'", slice.schema().name())),
            );
            return Series::null(slice.rows());
        }
    };
    let ty = slice
        .schema()
        .field(&offset)
        .map(|field| field.ty.clone())
        .unwrap_or_else(Type::null);
    match slice.column(&offset) {
        Ok(array) => Series { ty, array },
        Err(err) => {
            dh.emit(Diagnostic::warning(err.to_string()));
            Series::null(slice.rows())
        }
    }
}
