//! Conversion between Arrow arrays and scalar values.

use std::sync::Arc;

use arrow::array::{
    new_null_array, Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array,
    StringArray,
};
use arrow::compute::cast;
use arrow::datatypes::{
    DataType as ArrowDataType, Date32Type, Date64Type, Float16Type, Float32Type, Float64Type,
    Int16Type, Int32Type, Int64Type, Int8Type, TimeUnit, TimestampMicrosecondType,
    TimestampMillisecondType, TimestampNanosecondType, TimestampSecondType, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};

use common_error::{QuarryError, QuarryResult};
use quarry_core::Value;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// The value at row `index` of `array`.
///
/// Integers widen to `Int64`, floats to `Float64`. Dates are days since the
/// epoch and timestamps microseconds since the epoch, both as `Int64`.
pub fn array_value(array: &dyn Array, index: usize) -> QuarryResult<Value> {
    if array.is_null(index) {
        return Ok(Value::Null);
    }
    let value = match array.data_type() {
        ArrowDataType::Null => Value::Null,
        ArrowDataType::Boolean => Value::Bool(array.as_boolean().value(index)),
        ArrowDataType::Int8 => Value::Int64(array.as_primitive::<Int8Type>().value(index).into()),
        ArrowDataType::Int16 => {
            Value::Int64(array.as_primitive::<Int16Type>().value(index).into())
        }
        ArrowDataType::Int32 => {
            Value::Int64(array.as_primitive::<Int32Type>().value(index).into())
        }
        ArrowDataType::Int64 => Value::Int64(array.as_primitive::<Int64Type>().value(index)),
        ArrowDataType::UInt8 => {
            Value::Int64(array.as_primitive::<UInt8Type>().value(index).into())
        }
        ArrowDataType::UInt16 => {
            Value::Int64(array.as_primitive::<UInt16Type>().value(index).into())
        }
        ArrowDataType::UInt32 => {
            Value::Int64(array.as_primitive::<UInt32Type>().value(index).into())
        }
        ArrowDataType::UInt64 => {
            let v = array.as_primitive::<UInt64Type>().value(index);
            Value::Int64(i64::try_from(v).map_err(|_| {
                QuarryError::value_error(format!("UInt64 value {v} does not fit in Int64"))
            })?)
        }
        ArrowDataType::Float16 => {
            Value::Float64(array.as_primitive::<Float16Type>().value(index).to_f64())
        }
        ArrowDataType::Float32 => {
            Value::Float64(array.as_primitive::<Float32Type>().value(index).into())
        }
        ArrowDataType::Float64 => Value::Float64(array.as_primitive::<Float64Type>().value(index)),
        ArrowDataType::Utf8 => Value::String(array.as_string::<i32>().value(index).to_string()),
        ArrowDataType::LargeUtf8 => {
            Value::String(array.as_string::<i64>().value(index).to_string())
        }
        ArrowDataType::Utf8View => {
            Value::String(array.as_string_view().value(index).to_string())
        }
        ArrowDataType::Date32 => {
            Value::Int64(array.as_primitive::<Date32Type>().value(index).into())
        }
        ArrowDataType::Date64 => {
            Value::Int64(array.as_primitive::<Date64Type>().value(index) / MILLIS_PER_DAY)
        }
        ArrowDataType::Timestamp(unit, _) => Value::Int64(match unit {
            TimeUnit::Second => array
                .as_primitive::<TimestampSecondType>()
                .value(index)
                .saturating_mul(1_000_000),
            TimeUnit::Millisecond => array
                .as_primitive::<TimestampMillisecondType>()
                .value(index)
                .saturating_mul(1_000),
            TimeUnit::Microsecond => array.as_primitive::<TimestampMicrosecondType>().value(index),
            TimeUnit::Nanosecond => {
                array.as_primitive::<TimestampNanosecondType>().value(index) / 1_000
            }
        }),
        other => {
            return Err(QuarryError::type_error(format!(
                "cannot read a scalar value from a {other} column"
            )))
        }
    };
    Ok(value)
}

/// Every value of `array`, in order.
pub fn array_values(array: &dyn Array) -> QuarryResult<Vec<Value>> {
    (0..array.len()).map(|i| array_value(array, i)).collect()
}

/// Build an array of type `data_type` from `values`.
///
/// Values are first collected into the array type matching their variant,
/// then cast; a value whose variant does not match the others is a
/// `TypeError`.
pub fn values_to_array(values: &[Value], data_type: &ArrowDataType) -> QuarryResult<ArrayRef> {
    static NULL: Value = Value::Null;
    let kind = values.iter().find(|v| !v.is_null()).unwrap_or(&NULL);

    let mismatch = |v: &Value| {
        QuarryError::type_error(format!(
            "cannot store {} value {v} in a column of {}",
            v.type_name(),
            kind.type_name()
        ))
    };

    let array: ArrayRef = match kind {
        Value::Null => return Ok(new_null_array(data_type, values.len())),
        Value::Bool(_) => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    Value::Null => Ok(None),
                    Value::Bool(b) => Ok(Some(*b)),
                    other => Err(mismatch(other)),
                })
                .collect::<QuarryResult<BooleanArray>>()?,
        ),
        Value::Int64(_) => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    Value::Null => Ok(None),
                    Value::Int64(i) => Ok(Some(*i)),
                    other => Err(mismatch(other)),
                })
                .collect::<QuarryResult<Int64Array>>()?,
        ),
        // Integers mixed into a float column widen.
        Value::Float64(_) => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    Value::Null => Ok(None),
                    Value::Float64(_) | Value::Int64(_) => Ok(v.as_float64()),
                    other => Err(mismatch(other)),
                })
                .collect::<QuarryResult<Float64Array>>()?,
        ),
        Value::String(_) => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    Value::Null => Ok(None),
                    Value::String(s) => Ok(Some(s.as_str())),
                    other => Err(mismatch(other)),
                })
                .collect::<QuarryResult<StringArray>>()?,
        ),
    };

    cast_to(&array, data_type)
}

fn cast_to(array: &ArrayRef, data_type: &ArrowDataType) -> QuarryResult<ArrayRef> {
    if array.data_type() == data_type {
        return Ok(array.clone());
    }
    // Days are stored as Int64; Date32 casts only from Int32.
    if matches!(data_type, ArrowDataType::Date32) && array.data_type() == &ArrowDataType::Int64 {
        let days = cast(array, &ArrowDataType::Int32)?;
        return Ok(cast(&days, data_type)?);
    }
    Ok(cast(array, data_type)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Date32Array, Int32Array, UInt8Array};

    #[test]
    fn test_array_value_widens() {
        let ints = Int32Array::from(vec![Some(7), None]);
        assert_eq!(array_value(&ints, 0).unwrap(), Value::Int64(7));
        assert_eq!(array_value(&ints, 1).unwrap(), Value::Null);

        let small = UInt8Array::from(vec![200u8]);
        assert_eq!(array_value(&small, 0).unwrap(), Value::Int64(200));

        let dates = Date32Array::from(vec![19_000]);
        assert_eq!(array_value(&dates, 0).unwrap(), Value::Int64(19_000));
    }

    #[test]
    fn test_values_to_array_casts() {
        let values = vec![Value::Int64(1), Value::Null, Value::Int64(3)];
        let array = values_to_array(&values, &ArrowDataType::Int32).unwrap();
        assert_eq!(array.data_type(), &ArrowDataType::Int32);
        assert_eq!(array.null_count(), 1);
        assert_eq!(array.as_primitive::<Int32Type>().value(2), 3);

        let floats = vec![Value::Float64(1.5), Value::Int64(2)];
        let array = values_to_array(&floats, &ArrowDataType::Float64).unwrap();
        assert_eq!(array.as_primitive::<Float64Type>().value(1), 2.0);
    }

    #[test]
    fn test_values_to_array_dates() {
        let values = vec![Value::Int64(19_000)];
        let array = values_to_array(&values, &ArrowDataType::Date32).unwrap();
        assert_eq!(array.as_primitive::<Date32Type>().value(0), 19_000);
    }

    #[test]
    fn test_values_to_array_all_null_and_mismatch() {
        let array = values_to_array(&[Value::Null, Value::Null], &ArrowDataType::Utf8).unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array.data_type(), &ArrowDataType::Utf8);

        let mixed = vec![Value::from("a"), Value::Int64(1)];
        assert!(matches!(
            values_to_array(&mixed, &ArrowDataType::Utf8),
            Err(QuarryError::TypeError(_))
        ));
    }
}
