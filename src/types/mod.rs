mod row;
mod sql_value;

pub use row::{ColumnType, FieldMeta, QueryOutput, RawQueryResult, Row, Shaped};
pub use sql_value::SqlValue;
