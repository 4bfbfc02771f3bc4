//! Schema-tagged record batches and offset-based column access.

use std::sync::Arc;

use arrow::{
    array::{Array, ArrayRef, RecordBatch, StructArray},
    datatypes::Fields,
};
use sieve_predicate::{Offset, Schema};

use crate::error::SliceError;

/// A record batch whose rows all conform to one schema.
#[derive(Clone, Debug)]
pub struct TableSlice {
    schema: Schema,
    batch: RecordBatch,
    import_time: Option<i64>,
}

impl TableSlice {
    /// Wraps `batch`, checking that its columns have the layout of `schema`.
    pub fn new(schema: Schema, batch: RecordBatch) -> Result<Self, SliceError> {
        let expected = schema.to_arrow();
        check_fields(&schema, expected.fields(), batch.schema().fields())?;
        Ok(Self {
            schema,
            batch,
            import_time: None,
        })
    }

    /// Sets the import time in nanoseconds since the epoch.
    #[must_use]
    pub fn with_import_time(mut self, nanos: i64) -> Self {
        self.import_time = Some(nanos);
        self
    }

    /// Schema of every row.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The underlying Arrow batch.
    #[must_use]
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Import time in nanoseconds since the epoch, if known.
    #[must_use]
    pub fn import_time(&self) -> Option<i64> {
        self.import_time
    }

    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Column addressed by `offset`; see [`column`].
    pub fn column(&self, offset: &Offset) -> Result<ArrayRef, SliceError> {
        column(self, offset)
    }
}

fn check_fields(schema: &Schema, expected: &Fields, actual: &Fields) -> Result<(), SliceError> {
    let mismatch = |reason: String| SliceError::SchemaMismatch {
        schema: schema.name().to_string(),
        reason,
    };
    if expected.len() != actual.len() {
        return Err(mismatch(format!(
            "expected {} columns, got {}",
            expected.len(),
            actual.len()
        )));
    }
    for (expected, actual) in expected.iter().zip(actual.iter()) {
        if expected.name() != actual.name() {
            return Err(mismatch(format!(
                "expected column '{}', got '{}'",
                expected.name(),
                actual.name()
            )));
        }
        if !expected.data_type().equals_datatype(actual.data_type()) {
            return Err(mismatch(format!(
                "column '{}' has type {}, expected {}",
                actual.name(),
                actual.data_type(),
                expected.data_type()
            )));
        }
    }
    Ok(())
}

/// Fetches the array at `offset`, descending through struct columns.
///
/// The empty offset yields the whole batch as one struct column.
pub fn column(slice: &TableSlice, offset: &Offset) -> Result<ArrayRef, SliceError> {
    let Some((first, rest)) = offset.split_first() else {
        return Ok(Arc::new(StructArray::from(slice.batch.clone())));
    };
    if *first >= slice.batch.num_columns() {
        return Err(SliceError::InvalidOffset(offset.clone()));
    }
    let mut current = Arc::clone(slice.batch.column(*first));
    for index in rest {
        let child = current
            .as_any()
            .downcast_ref::<StructArray>()
            .filter(|parent| *index < parent.num_columns())
            .map(|parent| child_with_parent_nulls(parent, *index))
            .ok_or_else(|| SliceError::InvalidOffset(offset.clone()))??;
        current = child;
    }
    Ok(current)
}

/// Child column with the parent's nulls applied, so a null record yields null fields.
fn child_with_parent_nulls(parent: &StructArray, index: usize) -> Result<ArrayRef, SliceError> {
    let child = Arc::clone(parent.column(index));
    let Some(parent_nulls) = parent.nulls() else {
        return Ok(child);
    };
    let nulls = arrow::buffer::NullBuffer::union(Some(parent_nulls), child.nulls());
    let data = child.to_data().into_builder().nulls(nulls).build()?;
    Ok(arrow::array::make_array(data))
}
