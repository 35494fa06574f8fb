//! Read-path type coercion from wire text to JSON values.

use serde_json::{Number, Value};

use crate::error::{DbRelayError, Result};
use crate::types::{ColumnType, FieldMeta, QueryOutput, RawQueryResult, Row};

/// Convert one wire value according to its field metadata.
///
/// JSON columns are parsed, single-byte integers declared with length 1 become
/// booleans, and everything else goes through [`decode_default`].
pub fn cast_value(field: &FieldMeta, raw: Option<&str>) -> Result<Value> {
    match field.column_type {
        ColumnType::Json => match raw {
            Some(text) => serde_json::from_str(text).map_err(|source| DbRelayError::Decode {
                column: field.name.clone(),
                source,
            }),
            None => Ok(Value::Null),
        },
        ColumnType::Tiny if field.length == Some(1) => Ok(Value::Bool(raw == Some("1"))),
        _ => Ok(decode_default(field.column_type, raw)),
    }
}

/// Default decoding: numbers become JSON numbers when they fit, booleans
/// become JSON booleans, and the rest stays text.
pub fn decode_default(column_type: ColumnType, raw: Option<&str>) -> Value {
    let Some(text) = raw else {
        return Value::Null;
    };
    match column_type {
        ColumnType::Integer | ColumnType::Tiny => text
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(text.to_string())),
        ColumnType::Float => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(text.to_string())),
        ColumnType::Bool => Value::Bool(matches!(text, "t" | "true" | "1")),
        ColumnType::Json | ColumnType::Text => Value::String(text.to_string()),
    }
}

/// Materialize every raw row into a keyed [`Row`].
pub fn materialize(raw: RawQueryResult) -> Result<QueryOutput> {
    let mut rows = Vec::with_capacity(raw.rows.len());
    for values in raw.rows {
        let mut row = Row::with_capacity(raw.fields.len());
        for (field, value) in raw.fields.iter().zip(values) {
            row.insert(field.name.clone(), cast_value(field, value.as_deref())?);
        }
        rows.push(row);
    }
    Ok(QueryOutput {
        rows,
        fields: raw.fields,
        rows_affected: raw.rows_affected,
    })
}
