use async_trait::async_trait;

use crate::error::Result;
use crate::types::{RawQueryResult, SqlValue};

/// Trait for database driver implementations.
/// Drivers are responsible for:
/// - Turning bind values into safe SQL literals
/// - Executing fully bound SQL text and returning wire values with field metadata
/// - Leasing dedicated connections from their pool
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Render a value as an escaped SQL literal.
    fn escape(&self, value: &SqlValue) -> String;

    /// Execute SQL on any pooled connection.
    async fn query(&self, sql: &str) -> Result<RawQueryResult>;

    /// Lease a dedicated connection from the pool.
    async fn get_connection(&self) -> Result<Box<dyn DriverConnection>>;
}

/// A connection leased from a driver's pool.
#[async_trait]
pub trait DriverConnection: Send + Sync {
    async fn query(&self, sql: &str) -> Result<RawQueryResult>;

    async fn begin_transaction(&self) -> Result<()>;

    async fn commit(&self) -> Result<()>;

    async fn rollback(&self) -> Result<()>;

    /// Called exactly once, right before the connection is dropped.
    /// Pools that reclaim connections on drop can rely on the default.
    fn release(&self) {}
}
