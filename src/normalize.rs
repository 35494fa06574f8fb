//! Shapes raw rows into the value `execute` returns for each command kind.

use serde_json::Value;

use crate::builders::{ColumnGroup, Command, CommandKind};
use crate::error::{DbRelayError, Result};
use crate::types::{QueryOutput, Row, Shaped};

/// Column a COUNT command reads its scalar from.
pub const COUNT_COLUMN: &str = "count";

/// Shape the output of `command`.
///
/// Insert, update, delete, and insert-into key on the affected count, so DML
/// without `RETURNING` is told apart from a statement that touched nothing.
pub fn shape(command: &Command, output: QueryOutput) -> Result<Shaped> {
    let affected = output.rows_affected.max(output.rows.len() as u64);
    let mut rows = output.rows;

    let groups = &command.data().column_groups;
    if command.kind() != CommandKind::Count && !rows.is_empty() && !groups.is_empty() {
        for row in rows.iter_mut() {
            apply_column_groups(row, groups);
        }
    }

    let shaped = match command.kind() {
        CommandKind::Count => Shaped::Count(extract_count(&rows)?),
        CommandKind::Insert => {
            if affected == 0 {
                Shaped::Null
            } else if command.data().values.len() == 1 {
                Shaped::Row(rows.into_iter().next().unwrap_or_default())
            } else {
                Shaped::Rows(rows)
            }
        }
        CommandKind::Update | CommandKind::Delete | CommandKind::InsertInto => {
            if affected == 0 {
                Shaped::Null
            } else {
                Shaped::Rows(rows)
            }
        }
        CommandKind::Get => rows.into_iter().next().map_or(Shaped::Null, Shaped::Row),
        CommandKind::Select => Shaped::Rows(rows),
    };
    Ok(shaped)
}

/// Move each group's source columns into a nested object under the group name.
///
/// Source columns missing from the row are skipped. The group object replaces
/// any existing value stored under the group name.
pub fn apply_column_groups(row: &mut Row, groups: &[ColumnGroup]) {
    for group in groups {
        let mut nested = Row::with_capacity(group.columns.len());
        for (source, target) in &group.columns {
            if let Some(value) = row.shift_remove(source) {
                nested.insert(target.clone(), value);
            }
        }
        row.insert(group.name.clone(), Value::Object(nested));
    }
}

fn extract_count(rows: &[Row]) -> Result<i64> {
    let row = rows.first().ok_or(DbRelayError::UnexpectedRowCount {
        expected: 1,
        actual: 0,
    })?;
    let count = match row.get(COUNT_COLUMN) {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    };
    count.ok_or_else(|| DbRelayError::ColumnNotFound(COUNT_COLUMN.to_string()))
}
