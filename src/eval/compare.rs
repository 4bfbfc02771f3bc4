//! Column-versus-literal comparisons.

use std::sync::Arc;

use arrow::{
    array::{
        Array, ArrayRef, AsArray, BooleanArray, DurationNanosecondArray, Float64Array, Int64Array,
        Scalar, StringArray, TimestampNanosecondArray, UInt64Array,
    },
    compute::{
        is_not_null, is_null,
        kernels::cmp::{eq, gt, gt_eq, lt, lt_eq, neq},
    },
    datatypes::{
        DataType, DurationNanosecondType, Float64Type, Int64Type, TimeUnit,
        TimestampNanosecondType, UInt64Type,
    },
    error::ArrowError,
};
use sieve_predicate::{evaluate, Data, RelationalOperator};

/// Compares every row of `array` against `literal`; null rows yield null.
///
/// Scalar comparisons whose literal has the column's own Arrow type run through
/// the `cmp` kernels. Everything else is evaluated row by row.
pub(crate) fn compare_column(
    array: &ArrayRef,
    op: RelationalOperator,
    literal: &Data,
) -> Result<BooleanArray, ArrowError> {
    if literal.is_null() {
        match op {
            RelationalOperator::Equal => return is_null(array.as_ref()),
            RelationalOperator::NotEqual => return is_not_null(array.as_ref()),
            _ => {}
        }
    }
    if let Some(scalar) = literal_scalar(literal, array.data_type()) {
        let scalar = Scalar::new(scalar);
        match op {
            RelationalOperator::Equal => return eq(array, &scalar),
            RelationalOperator::NotEqual => return neq(array, &scalar),
            RelationalOperator::Less => return lt(array, &scalar),
            RelationalOperator::LessEqual => return lt_eq(array, &scalar),
            RelationalOperator::Greater => return gt(array, &scalar),
            RelationalOperator::GreaterEqual => return gt_eq(array, &scalar),
            _ => {}
        }
    }
    Ok(compare_rows(array.as_ref(), op, literal))
}

fn compare_rows(array: &dyn Array, op: RelationalOperator, literal: &Data) -> BooleanArray {
    (0..array.len())
        .map(|row| data_at(array, row).map(|value| evaluate(&value, op, literal)))
        .collect()
}

fn literal_scalar(literal: &Data, data_type: &DataType) -> Option<ArrayRef> {
    let array: ArrayRef = match (literal, data_type) {
        (Data::Bool(value), DataType::Boolean) => Arc::new(BooleanArray::from(vec![*value])),
        (Data::Int64(value), DataType::Int64) => Arc::new(Int64Array::from(vec![*value])),
        (Data::UInt64(value), DataType::UInt64) => Arc::new(UInt64Array::from(vec![*value])),
        (Data::Double(value), DataType::Float64) => Arc::new(Float64Array::from(vec![*value])),
        (Data::String(value), DataType::Utf8) => Arc::new(StringArray::from(vec![value.as_str()])),
        (Data::Time(value), DataType::Timestamp(TimeUnit::Nanosecond, tz)) => {
            Arc::new(TimestampNanosecondArray::from(vec![*value]).with_timezone_opt(tz.clone()))
        }
        (Data::Duration(value), DataType::Duration(TimeUnit::Nanosecond)) => {
            Arc::new(DurationNanosecondArray::from(vec![*value]))
        }
        _ => return None,
    };
    Some(array)
}

/// Value of `array` at `row` as a literal; `None` for nulls and unsupported types.
fn data_at(array: &dyn Array, row: usize) -> Option<Data> {
    if array.is_null(row) {
        return None;
    }
    let value = match array.data_type() {
        DataType::Boolean => Data::Bool(array.as_boolean().value(row)),
        DataType::Int64 => Data::Int64(array.as_primitive::<Int64Type>().value(row)),
        DataType::UInt64 => Data::UInt64(array.as_primitive::<UInt64Type>().value(row)),
        DataType::Float64 => Data::Double(array.as_primitive::<Float64Type>().value(row)),
        DataType::Utf8 => Data::String(array.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Data::String(array.as_string::<i64>().value(row).to_string()),
        DataType::Binary => Data::Blob(array.as_binary::<i32>().value(row).to_vec()),
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            Data::Time(array.as_primitive::<TimestampNanosecondType>().value(row))
        }
        DataType::Duration(TimeUnit::Nanosecond) => {
            Data::Duration(array.as_primitive::<DurationNanosecondType>().value(row))
        }
        DataType::List(_) => {
            let values = array.as_list::<i32>().value(row);
            Data::List(
                (0..values.len())
                    .map(|idx| data_at(values.as_ref(), idx).unwrap_or(Data::Null))
                    .collect(),
            )
        }
        _ => return None,
    };
    Some(value)
}
