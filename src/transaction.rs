//! Transaction coordination on a single connection.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tracing::warn;

use crate::client::DbRelay;
use crate::connection::ConnectionHandle;
use crate::error::DbRelayError;

/// Future returned by a transaction's work closure, borrowing the connection.
pub type WorkFuture<'c, T, E> = Pin<Box<dyn Future<Output = std::result::Result<T, E>> + Send + 'c>>;

/// Lifecycle of one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Idle,
    Began,
    Committed,
    RolledBack,
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionState::Idle => "IDLE",
            TransactionState::Began => "BEGAN",
            TransactionState::Committed => "COMMITTED",
            TransactionState::RolledBack => "ROLLED BACK",
        };
        f.write_str(label)
    }
}

impl DbRelay {
    /// Run `work` inside a transaction.
    ///
    /// With `Some(handle)` the transaction runs on that connection and the
    /// caller keeps ownership of it. With `None` a connection is leased from
    /// the pool and released once the transaction ends.
    ///
    /// On success the transaction is committed and `work`'s value returned. If
    /// `work` fails, the transaction is rolled back and `work`'s error is
    /// returned. If commit fails, the transaction is rolled back and the
    /// commit error is returned. Rollback errors are only logged.
    ///
    /// Dropping the returned future mid-`work` skips the rollback here. A
    /// leased connection still goes back to the pool, which issues `ROLLBACK`
    /// when it recycles the connection. A caller-supplied handle is left with
    /// the transaction open.
    ///
    /// # Example
    /// ```ignore
    /// let relay2 = relay.clone();
    /// let id = relay
    ///     .transaction(
    ///         move |conn| {
    ///             Box::pin(async move {
    ///                 let user = relay2.insert("users").values([("name", "Ann")]).execute(Some(conn)).await?;
    ///                 Ok::<_, DbRelayError>(user)
    ///             })
    ///         },
    ///         None,
    ///     )
    ///     .await?;
    /// ```
    pub async fn transaction<T, E, F>(
        &self,
        work: F,
        handle: Option<&ConnectionHandle>,
    ) -> std::result::Result<T, E>
    where
        F: for<'c> FnOnce(&'c ConnectionHandle) -> WorkFuture<'c, T, E>,
        E: From<DbRelayError>,
    {
        match handle {
            Some(conn) => self.run_transaction(conn, work).await,
            None => {
                let conn = self.get_connection().await?;
                let outcome = self.run_transaction(&conn, work).await;
                conn.release();
                outcome
            }
        }
    }

    async fn run_transaction<T, E, F>(
        &self,
        conn: &ConnectionHandle,
        work: F,
    ) -> std::result::Result<T, E>
    where
        F: for<'c> FnOnce(&'c ConnectionHandle) -> WorkFuture<'c, T, E>,
        E: From<DbRelayError>,
    {
        conn.begin_transaction().await?;
        self.log_state(TransactionState::Began);

        match work(conn).await {
            Ok(value) => match conn.commit().await {
                Ok(()) => {
                    self.log_state(TransactionState::Committed);
                    Ok(value)
                }
                Err(commit_err) => {
                    self.roll_back(conn).await;
                    Err(commit_err.into())
                }
            },
            Err(work_err) => {
                self.roll_back(conn).await;
                Err(work_err)
            }
        }
    }

    async fn roll_back(&self, conn: &ConnectionHandle) {
        match conn.rollback().await {
            Ok(()) => self.log_state(TransactionState::RolledBack),
            Err(e) => warn!(relay = %self.id(), error = %e, "transaction rollback failed"),
        }
    }

    fn log_state(&self, state: TransactionState) {
        self.log_debug(&format!("TRANSACTION {state}"));
    }
}
