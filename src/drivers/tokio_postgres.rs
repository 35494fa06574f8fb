use async_trait::async_trait;
use deadpool_postgres::{Object, Pool, Runtime};
use tokio_postgres::types::Type;
use tokio_postgres::{NoTls, SimpleQueryMessage, SimpleQueryRow};

use crate::config::RelayConfig;
use crate::error::{DbRelayError, Result};
use crate::traits::{DatabaseDriver, DriverConnection};
use crate::types::{ColumnType, FieldMeta, RawQueryResult, SqlValue};

/// PostgreSQL driver implementation using tokio-postgres behind a deadpool pool.
pub struct TokioPostgresDriver {
    pool: Pool,
}

impl TokioPostgresDriver {
    /// Create the pool. Connections are opened lazily on first use.
    pub fn connect(config: &RelayConfig) -> Result<Self> {
        let pool = config
            .to_pool_config()
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| DbRelayError::ConnectionFailed(e.to_string()))?;
        Ok(Self { pool })
    }

    async fn lease(&self) -> Result<Object> {
        self.pool
            .get()
            .await
            .map_err(|e| DbRelayError::ConnectionFailed(e.to_string()))
    }
}

#[async_trait]
impl DatabaseDriver for TokioPostgresDriver {
    fn escape(&self, value: &SqlValue) -> String {
        escape_value(value)
    }

    async fn query(&self, sql: &str) -> Result<RawQueryResult> {
        let client = self.lease().await?;
        run_query(&client, sql).await
    }

    async fn get_connection(&self) -> Result<Box<dyn DriverConnection>> {
        let client = self.lease().await?;
        Ok(Box::new(PooledConnection { client }))
    }
}

/// A pooled client. Dropping it hands the connection back to the pool.
struct PooledConnection {
    client: Object,
}

impl PooledConnection {
    async fn batch(&self, sql: &str) -> Result<()> {
        self.client
            .batch_execute(sql)
            .await
            .map_err(|e| DbRelayError::TransactionFailed(e.to_string()))
    }
}

#[async_trait]
impl DriverConnection for PooledConnection {
    async fn query(&self, sql: &str) -> Result<RawQueryResult> {
        run_query(&self.client, sql).await
    }

    async fn begin_transaction(&self) -> Result<()> {
        self.batch("BEGIN").await
    }

    async fn commit(&self) -> Result<()> {
        self.batch("COMMIT").await
    }

    async fn rollback(&self) -> Result<()> {
        self.batch("ROLLBACK").await
    }
}

/// Render a value as a PostgreSQL literal.
fn escape_value(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Text(s) => postgres_protocol::escape::escape_literal(s),
        SqlValue::Int32(i) => i.to_string(),
        SqlValue::Int64(i) => i.to_string(),
        SqlValue::Float(f) if f.is_finite() => f.to_string(),
        SqlValue::Float(f) => format!("'{f}'::float8").replace("inf", "Infinity"),
        SqlValue::Bool(true) => "TRUE".to_string(),
        SqlValue::Bool(false) => "FALSE".to_string(),
        SqlValue::Json(v) => postgres_protocol::escape::escape_literal(&v.to_string()),
    }
}

/// Run fully bound SQL and collect every column as wire text.
///
/// Column metadata comes from preparing the statement, so it is reported even
/// when no rows come back. Values come from the simple query protocol, which
/// renders every type as text.
async fn run_query(client: &Object, sql: &str) -> Result<RawQueryResult> {
    let statement = client.prepare(sql).await.map_err(query_failed)?;
    let fields: Vec<FieldMeta> = statement
        .columns()
        .iter()
        .map(|c| FieldMeta::new(c.name(), column_type(c.type_())))
        .collect();

    let messages = client.simple_query(sql).await.map_err(query_failed)?;
    let mut rows = Vec::new();
    let mut rows_affected = 0;
    for message in messages {
        match message {
            SimpleQueryMessage::Row(row) => rows.push(row_text(&row)),
            SimpleQueryMessage::CommandComplete(n) => rows_affected = n,
            _ => {}
        }
    }

    Ok(RawQueryResult::new(fields, rows).with_rows_affected(rows_affected))
}

fn row_text(row: &SimpleQueryRow) -> Vec<Option<String>> {
    (0..row.len())
        .map(|i| row.get(i).map(str::to_string))
        .collect()
}

fn query_failed(e: tokio_postgres::Error) -> DbRelayError {
    DbRelayError::QueryFailed(e.to_string())
}

/// Map a server type to the coercion rule its text goes through.
/// Types without a rule, such as numeric or uuid, keep their exact text.
fn column_type(ty: &Type) -> ColumnType {
    match *ty {
        Type::JSON | Type::JSONB => ColumnType::Json,
        Type::INT2 | Type::INT4 | Type::INT8 | Type::OID => ColumnType::Integer,
        Type::FLOAT4 | Type::FLOAT8 => ColumnType::Float,
        Type::BOOL => ColumnType::Bool,
        _ => ColumnType::Text,
    }
}
