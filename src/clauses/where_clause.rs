use crate::types::SqlValue;

/// Comparison operators usable in a WHERE condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
}

impl CompareOp {
    fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "<>",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Like => "LIKE",
        }
    }
}

/// Represents a WHERE clause condition.
/// Supports basic comparison operations and logical combinations.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereClause {
    /// column <op> value
    Compare(String, CompareOp, SqlValue),
    /// column IN (values)
    In(String, Vec<SqlValue>),
    /// column IS NULL
    IsNull(String),
    /// column IS NOT NULL
    IsNotNull(String),
    /// clause AND clause
    And(Box<WhereClause>, Box<WhereClause>),
    /// clause OR clause
    Or(Box<WhereClause>, Box<WhereClause>),
}

impl WhereClause {
    /// Creates an equality condition: column = value
    pub fn eq<V: Into<SqlValue>>(column: &str, value: V) -> Self {
        Self::compare(column, CompareOp::Eq, value)
    }

    pub fn ne<V: Into<SqlValue>>(column: &str, value: V) -> Self {
        Self::compare(column, CompareOp::NotEq, value)
    }

    pub fn gt<V: Into<SqlValue>>(column: &str, value: V) -> Self {
        Self::compare(column, CompareOp::Gt, value)
    }

    pub fn gte<V: Into<SqlValue>>(column: &str, value: V) -> Self {
        Self::compare(column, CompareOp::Gte, value)
    }

    pub fn lt<V: Into<SqlValue>>(column: &str, value: V) -> Self {
        Self::compare(column, CompareOp::Lt, value)
    }

    pub fn lte<V: Into<SqlValue>>(column: &str, value: V) -> Self {
        Self::compare(column, CompareOp::Lte, value)
    }

    pub fn like<V: Into<SqlValue>>(column: &str, pattern: V) -> Self {
        Self::compare(column, CompareOp::Like, pattern)
    }

    pub fn compare<V: Into<SqlValue>>(column: &str, op: CompareOp, value: V) -> Self {
        WhereClause::Compare(column.to_string(), op, value.into())
    }

    /// Creates a membership condition: column IN (v1, v2, ...)
    pub fn in_list<V: Into<SqlValue>>(column: &str, values: impl IntoIterator<Item = V>) -> Self {
        WhereClause::In(column.to_string(), values.into_iter().map(Into::into).collect())
    }

    pub fn is_null(column: &str) -> Self {
        WhereClause::IsNull(column.to_string())
    }

    pub fn is_not_null(column: &str) -> Self {
        WhereClause::IsNotNull(column.to_string())
    }

    /// Combines this clause with another using AND
    pub fn and(self, other: WhereClause) -> Self {
        WhereClause::And(Box::new(self), Box::new(other))
    }

    /// Combines this clause with another using OR
    pub fn or(self, other: WhereClause) -> Self {
        WhereClause::Or(Box::new(self), Box::new(other))
    }

    /// Builds the SQL string and collects parameters.
    /// Placeholders are numbered after the values already in `params`.
    pub fn build_sql(&self, params: &mut Vec<SqlValue>) -> String {
        match self {
            WhereClause::Compare(col, op, value) => {
                params.push(value.clone());
                format!("{} {} ${}", col, op.as_sql(), params.len())
            }
            // An empty IN list matches nothing.
            WhereClause::In(_, values) if values.is_empty() => "1 = 0".to_string(),
            WhereClause::In(col, values) => {
                let markers: Vec<String> = values
                    .iter()
                    .map(|value| {
                        params.push(value.clone());
                        format!("${}", params.len())
                    })
                    .collect();
                format!("{} IN ({})", col, markers.join(", "))
            }
            WhereClause::IsNull(col) => format!("{col} IS NULL"),
            WhereClause::IsNotNull(col) => format!("{col} IS NOT NULL"),
            WhereClause::And(left, right) => {
                let left_sql = left.build_sql(params);
                let right_sql = right.build_sql(params);
                format!("({}) AND ({})", left_sql, right_sql)
            }
            WhereClause::Or(left, right) => {
                let left_sql = left.build_sql(params);
                let right_sql = right.build_sql(params);
                format!("({}) OR ({})", left_sql, right_sql)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eq_clause() {
        let clause = WhereClause::eq("users.name", "John");
        let mut params = Vec::new();
        let sql = clause.build_sql(&mut params);

        assert_eq!(sql, "users.name = $1");
        assert_eq!(params.len(), 1);
        assert_eq!(params[0], SqlValue::Text("John".to_string()));
    }

    #[test]
    fn test_and_clause() {
        let clause = WhereClause::eq("name", "John").and(WhereClause::gt("age", 30));

        let mut params = Vec::new();
        let sql = clause.build_sql(&mut params);

        assert_eq!(sql, "(name = $1) AND (age > $2)");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_numbering_continues_after_existing_params() {
        let mut params = vec![SqlValue::Int32(9)];
        let sql = WhereClause::ne("id", 1).build_sql(&mut params);
        assert_eq!(sql, "id <> $2");
    }

    #[test]
    fn test_in_clause() {
        let mut params = Vec::new();
        let sql = WhereClause::in_list("id", [1, 2, 3])
            .or(WhereClause::is_null("id"))
            .build_sql(&mut params);
        assert_eq!(sql, "(id IN ($1, $2, $3)) OR (id IS NULL)");
        assert_eq!(params, vec![SqlValue::Int32(1), SqlValue::Int32(2), SqlValue::Int32(3)]);
    }

    #[test]
    fn test_empty_in_clause_matches_nothing() {
        let mut params = Vec::new();
        let sql = WhereClause::in_list::<i32>("id", []).build_sql(&mut params);
        assert_eq!(sql, "1 = 0");
        assert!(params.is_empty());
    }
}
