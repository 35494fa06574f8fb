use serde_json::{Map, Value};

/// A materialized result row keyed by column name, in column order.
pub type Row = Map<String, Value>;

/// Wire-level column type reported by a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Json,
    /// Single-byte integer. With a declared length of 1 it carries a boolean.
    Tiny,
    Integer,
    Float,
    Bool,
    Text,
}

/// Column metadata as reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMeta {
    pub name: String,
    pub column_type: ColumnType,
    /// Declared display length, when the driver knows it.
    pub length: Option<u32>,
}

impl FieldMeta {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            length: None,
        }
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }
}

/// Driver-agnostic raw result from a database query.
/// Values are kept in their wire text form; `None` is SQL NULL.
#[derive(Debug, Clone, Default)]
pub struct RawQueryResult {
    /// Column metadata in order
    pub fields: Vec<FieldMeta>,
    /// Rows, where each row holds one wire value per field
    pub rows: Vec<Vec<Option<String>>>,
    /// Rows the statement inserted, updated, deleted, or returned
    pub rows_affected: u64,
}

impl RawQueryResult {
    /// Result whose affected count is the number of returned rows.
    pub fn new(fields: Vec<FieldMeta>, rows: Vec<Vec<Option<String>>>) -> Self {
        let rows_affected = rows.len() as u64;
        Self {
            fields,
            rows,
            rows_affected,
        }
    }

    /// Override the affected count, e.g. for DML without `RETURNING`.
    pub fn with_rows_affected(mut self, rows_affected: u64) -> Self {
        self.rows_affected = rows_affected;
        self
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Rows and field metadata returned by `DbRelay::query`.
#[derive(Debug, Clone, Default)]
pub struct QueryOutput {
    pub rows: Vec<Row>,
    pub fields: Vec<FieldMeta>,
    pub rows_affected: u64,
}

impl QueryOutput {
    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if no rows came back.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The value handed back by `execute`, shaped by command kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Shaped {
    Null,
    Row(Row),
    Rows(Vec<Row>),
    Count(i64),
}

impl Shaped {
    pub fn is_null(&self) -> bool {
        matches!(self, Shaped::Null)
    }

    /// Returns the single row, if this is one.
    pub fn into_row(self) -> Option<Row> {
        match self {
            Shaped::Row(row) => Some(row),
            _ => None,
        }
    }

    /// Returns the rows of a list result. `Null` yields an empty list and a
    /// single row yields a one-element list.
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Shaped::Rows(rows) => rows,
            Shaped::Row(row) => vec![row],
            Shaped::Null | Shaped::Count(_) => Vec::new(),
        }
    }

    pub fn count(&self) -> Option<i64> {
        match self {
            Shaped::Count(n) => Some(*n),
            _ => None,
        }
    }

    /// Converts into a plain JSON value.
    pub fn into_value(self) -> Value {
        match self {
            Shaped::Null => Value::Null,
            Shaped::Row(row) => Value::Object(row),
            Shaped::Rows(rows) => Value::Array(rows.into_iter().map(Value::Object).collect()),
            Shaped::Count(n) => Value::from(n),
        }
    }
}
