//! Client-side parameter binding.
//!
//! Builders render SQL with PostgreSQL-style `$1, $2, ...` markers. Before the
//! text reaches a driver, each marker is replaced by the driver's escaped
//! literal of the matching value. Markers without a matching value stay as
//! they are.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::error::{DbRelayError, Result};
use crate::types::SqlValue;

static MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$(\d+)").unwrap());

/// Replace every `$N` marker in `template` with `escape(values[N - 1])`.
///
/// Structured JSON values (objects and arrays) are serialized to JSON text and
/// escaped as a string literal.
pub fn bind_params<F>(template: &str, values: &[SqlValue], escape: F) -> Result<String>
where
    F: Fn(&SqlValue) -> String,
{
    if values.is_empty() {
        return Ok(template.to_string());
    }

    let mut sql = String::with_capacity(template.len());
    let mut last = 0;
    for caps in MARKER.captures_iter(template) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        sql.push_str(&template[last..whole.start()]);
        match lookup(&caps, values) {
            Some(value) => {
                let literal = as_literal(value)?;
                sql.push_str(&escape(&literal));
            }
            None => sql.push_str(whole.as_str()),
        }
        last = whole.end();
    }
    sql.push_str(&template[last..]);
    Ok(sql)
}

/// Resolve a marker's 1-based index into `values`.
fn lookup<'v>(caps: &Captures<'_>, values: &'v [SqlValue]) -> Option<&'v SqlValue> {
    let n: usize = caps.get(1)?.as_str().parse().ok()?;
    values.get(n.checked_sub(1)?)
}

/// Lower a `Json` value to the plain value the driver escapes.
fn as_literal(value: &SqlValue) -> Result<Cow<'_, SqlValue>> {
    let SqlValue::Json(json) = value else {
        return Ok(Cow::Borrowed(value));
    };
    let lowered = match json {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Bool(*b),
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Int64(i),
            None => n
                .as_f64()
                .map(SqlValue::Float)
                .unwrap_or_else(|| SqlValue::Text(n.to_string())),
        },
        Value::Object(_) | Value::Array(_) => {
            SqlValue::Text(serde_json::to_string(json).map_err(DbRelayError::Serialization)?)
        }
    };
    Ok(Cow::Owned(lowered))
}
