use std::fmt;

use crate::error::Result;
use crate::traits::DriverConnection;
use crate::types::RawQueryResult;

/// A connection leased from the pool.
///
/// Commands executed with `Some(&handle)` run on this connection, which is
/// how a transaction pins its statements. The connection goes back to the
/// driver exactly once, when the handle is released or dropped.
pub struct ConnectionHandle {
    conn: Box<dyn DriverConnection>,
}

impl ConnectionHandle {
    pub(crate) fn new(conn: Box<dyn DriverConnection>) -> Self {
        Self { conn }
    }

    pub(crate) async fn query(&self, sql: &str) -> Result<RawQueryResult> {
        self.conn.query(sql).await
    }

    pub(crate) async fn begin_transaction(&self) -> Result<()> {
        self.conn.begin_transaction().await
    }

    pub(crate) async fn commit(&self) -> Result<()> {
        self.conn.commit().await
    }

    pub(crate) async fn rollback(&self) -> Result<()> {
        self.conn.rollback().await
    }

    /// Return the connection to the pool.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        self.conn.release();
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle").finish_non_exhaustive()
    }
}
