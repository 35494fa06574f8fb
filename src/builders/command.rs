use crate::clauses::WhereClause;
use crate::types::SqlValue;

/// The kind of a command. Result shaping dispatches on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Select,
    Get,
    Count,
    Insert,
    Update,
    Delete,
    InsertInto,
}

/// Folds flat result columns into one nested object per row.
///
/// Each entry maps a result column (`source`) to a field (`target`) of the
/// object stored under `name`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnGroup {
    pub name: String,
    pub columns: Vec<(String, String)>,
}

impl ColumnGroup {
    pub fn new(name: impl Into<String>, columns: &[(&str, &str)]) -> Self {
        Self {
            name: name.into(),
            columns: columns
                .iter()
                .map(|(source, target)| (source.to_string(), target.to_string()))
                .collect(),
        }
    }
}

/// One row of values for an INSERT, as (column, value) pairs.
pub type ValueSet = Vec<(String, SqlValue)>;

/// Payload carried by a command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandData {
    pub table: String,
    /// Selected columns; empty means `*`.
    pub columns: Vec<String>,
    pub returning: Vec<String>,
    pub column_groups: Vec<ColumnGroup>,
    /// Insert rows. One entry means a single-record insert.
    pub values: Vec<ValueSet>,
    /// Update assignments.
    pub sets: Vec<(String, SqlValue)>,
    pub where_clause: Option<WhereClause>,
    /// (column, descending)
    pub order_by: Vec<(String, bool)>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// Target columns of an INSERT ... SELECT.
    pub into_columns: Vec<String>,
    /// Source query of an INSERT ... SELECT.
    pub source: Option<Box<Command>>,
}

/// A query command built through a fluent chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    kind: CommandKind,
    data: CommandData,
}

impl Command {
    fn new(kind: CommandKind, table: &str) -> Self {
        Self {
            kind,
            data: CommandData {
                table: table.to_string(),
                ..CommandData::default()
            },
        }
    }

    /// SELECT returning every matching row.
    pub fn select(table: &str) -> Self {
        Self::new(CommandKind::Select, table)
    }

    /// SELECT returning the first matching row.
    pub fn get(table: &str) -> Self {
        Self::new(CommandKind::Get, table)
    }

    /// SELECT COUNT(*).
    pub fn count(table: &str) -> Self {
        Self::new(CommandKind::Count, table)
    }

    pub fn insert(table: &str) -> Self {
        Self::new(CommandKind::Insert, table)
    }

    /// INSERT INTO `table` (`columns`) fed by the `source` query.
    pub fn insert_into(table: &str, columns: &[&str], source: Command) -> Self {
        let mut command = Self::new(CommandKind::InsertInto, table);
        command.data.into_columns = to_strings(columns);
        command.data.source = Some(Box::new(source));
        command
    }

    pub fn update(table: &str) -> Self {
        Self::new(CommandKind::Update, table)
    }

    pub fn delete(table: &str) -> Self {
        Self::new(CommandKind::Delete, table)
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn data(&self) -> &CommandData {
        &self.data
    }

    /// Specify the columns to select.
    pub fn columns(mut self, cols: &[&str]) -> Self {
        self.data.columns = to_strings(cols);
        self
    }

    /// Add a WHERE clause. A second call ANDs onto the first.
    pub fn where_(mut self, clause: WhereClause) -> Self {
        self.data.where_clause = Some(match self.data.where_clause.take() {
            Some(existing) => existing.and(clause),
            None => clause,
        });
        self
    }

    /// Fold `columns` (source, target) of each result row into an object named `name`.
    pub fn group(mut self, name: &str, columns: &[(&str, &str)]) -> Self {
        self.data.column_groups.push(ColumnGroup::new(name, columns));
        self
    }

    pub fn returning(mut self, cols: &[&str]) -> Self {
        self.data.returning = to_strings(cols);
        self
    }

    /// Add one row of values to an INSERT.
    pub fn values<K, V>(mut self, row: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<SqlValue>,
    {
        self.data
            .values
            .push(row.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    /// Assign `column = value` in an UPDATE.
    pub fn set<V: Into<SqlValue>>(mut self, column: &str, value: V) -> Self {
        self.data.sets.push((column.to_string(), value.into()));
        self
    }

    pub fn order_by(mut self, column: &str) -> Self {
        self.data.order_by.push((column.to_string(), false));
        self
    }

    pub fn order_by_desc(mut self, column: &str) -> Self {
        self.data.order_by.push((column.to_string(), true));
        self
    }

    /// Add a LIMIT to the query.
    pub fn limit(mut self, n: u64) -> Self {
        self.data.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.data.offset = Some(n);
        self
    }

    /// Render the SQL template and its bind values.
    pub fn to_params(&self) -> (String, Vec<SqlValue>) {
        let mut params = Vec::new();
        let sql = self.build_sql(&mut params);
        (sql, params)
    }

    fn build_sql(&self, params: &mut Vec<SqlValue>) -> String {
        let data = &self.data;
        let mut sql = String::with_capacity(256);

        match self.kind {
            CommandKind::Select | CommandKind::Get => {
                sql.push_str("SELECT ");
                if data.columns.is_empty() {
                    sql.push('*');
                } else {
                    sql.push_str(&data.columns.join(", "));
                }
                sql.push_str(" FROM ");
                sql.push_str(&data.table);
                self.push_where(&mut sql, params);
                self.push_order_by(&mut sql);
                let limit = match self.kind {
                    CommandKind::Get => Some(1),
                    _ => data.limit,
                };
                if let Some(limit) = limit {
                    sql.push_str(&format!(" LIMIT {limit}"));
                }
                if let Some(offset) = data.offset {
                    sql.push_str(&format!(" OFFSET {offset}"));
                }
            }
            CommandKind::Count => {
                sql.push_str("SELECT COUNT(*) AS count FROM ");
                sql.push_str(&data.table);
                self.push_where(&mut sql, params);
            }
            CommandKind::Insert => {
                let columns = insert_columns(&data.values);
                sql.push_str(&format!(
                    "INSERT INTO {} ({}) VALUES ",
                    data.table,
                    columns.join(", ")
                ));
                let tuples: Vec<String> = data
                    .values
                    .iter()
                    .map(|row| {
                        let markers: Vec<String> = columns
                            .iter()
                            .map(|col| {
                                let value = row
                                    .iter()
                                    .find(|(name, _)| name == col)
                                    .map(|(_, value)| value.clone())
                                    .unwrap_or(SqlValue::Null);
                                params.push(value);
                                format!("${}", params.len())
                            })
                            .collect();
                        format!("({})", markers.join(", "))
                    })
                    .collect();
                sql.push_str(&tuples.join(", "));
                self.push_returning(&mut sql);
            }
            CommandKind::InsertInto => {
                sql.push_str("INSERT INTO ");
                sql.push_str(&data.table);
                if !data.into_columns.is_empty() {
                    sql.push_str(&format!(" ({})", data.into_columns.join(", ")));
                }
                if let Some(source) = &data.source {
                    sql.push(' ');
                    sql.push_str(&source.build_sql(params));
                }
                self.push_returning(&mut sql);
            }
            CommandKind::Update => {
                sql.push_str("UPDATE ");
                sql.push_str(&data.table);
                sql.push_str(" SET ");
                let assignments: Vec<String> = data
                    .sets
                    .iter()
                    .map(|(col, value)| {
                        params.push(value.clone());
                        format!("{} = ${}", col, params.len())
                    })
                    .collect();
                sql.push_str(&assignments.join(", "));
                self.push_where(&mut sql, params);
                self.push_returning(&mut sql);
            }
            CommandKind::Delete => {
                sql.push_str("DELETE FROM ");
                sql.push_str(&data.table);
                self.push_where(&mut sql, params);
                self.push_returning(&mut sql);
            }
        }

        sql
    }

    fn push_where(&self, sql: &mut String, params: &mut Vec<SqlValue>) {
        if let Some(ref where_clause) = self.data.where_clause {
            sql.push_str(" WHERE ");
            let where_sql = where_clause.build_sql(params);
            sql.push_str(&where_sql);
        }
    }

    fn push_order_by(&self, sql: &mut String) {
        if self.data.order_by.is_empty() {
            return;
        }
        let terms: Vec<String> = self
            .data
            .order_by
            .iter()
            .map(|(col, desc)| if *desc { format!("{col} DESC") } else { col.clone() })
            .collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&terms.join(", "));
    }

    fn push_returning(&self, sql: &mut String) {
        if !self.data.returning.is_empty() {
            sql.push_str(" RETURNING ");
            sql.push_str(&self.data.returning.join(", "));
        }
    }
}

/// Union of the columns named by every insert row, in first-seen order.
fn insert_columns(rows: &[ValueSet]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for (name, _) in rows.iter().flatten() {
        if !columns.contains(name) {
            columns.push(name.clone());
        }
    }
    columns
}

fn to_strings(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|s| s.to_string()).collect()
}
