//! Conversion of tabular data into result rows

use serde_json::{Map, Value};

use crate::map::RowResult;
use crate::{LeafletError, Result};

/// Build rows from JSON records; the record's position is its row index.
pub fn rows_from_records(records: Vec<Value>) -> Result<Vec<RowResult>> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| match record {
            Value::Object(fields) => Ok(row_from_fields(index, fields)),
            other => Err(LeafletError::ReaderError(format!(
                "Row {} is not an object: {}",
                index, other
            ))),
        })
        .collect()
}

fn row_from_fields(index: usize, fields: Map<String, Value>) -> RowResult {
    let mut row = RowResult::new(index);
    for (name, value) in fields {
        row.set_field(name, value);
    }
    row
}

/// Build rows from a Polars DataFrame, one per DataFrame row.
#[cfg(feature = "csv")]
pub fn rows_from_dataframe(df: &polars::prelude::DataFrame) -> Vec<RowResult> {
    let columns = df.get_columns();
    (0..df.height())
        .map(|index| {
            let mut row = RowResult::new(index);
            for column in columns {
                row.set_field(column.name().as_str(), column_value_to_json(column, index));
            }
            row
        })
        .collect()
}

/// Convert a single value from a Polars Column to JSON
#[cfg(feature = "csv")]
fn column_value_to_json(column: &polars::prelude::Column, idx: usize) -> Value {
    use polars::prelude::AnyValue;

    let any_value = match column.get(idx) {
        Ok(v) => v,
        Err(_) => return Value::Null,
    };

    match any_value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::Int32(v) => Value::Number(v.into()),
        AnyValue::Int64(v) => Value::Number(v.into()),
        AnyValue::UInt32(v) => Value::Number(v.into()),
        AnyValue::UInt64(v) => Value::Number(v.into()),
        AnyValue::Float32(v) => serde_json::Number::from_f64(v as f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        AnyValue::Float64(v) => serde_json::Number::from_f64(v)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        other => {
            tracing::debug!("Converting unsupported Polars type to string: {:?}", other);
            Value::String(format!("{}", other))
        }
    }
}
