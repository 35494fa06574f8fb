use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::binder::bind_params;
use crate::builders::Command;
use crate::coercion::materialize;
use crate::config::RelayConfig;
use crate::connection::ConnectionHandle;
use crate::drivers::TokioPostgresDriver;
use crate::error::Result;
use crate::normalize::shape;
use crate::traits::DatabaseDriver;
use crate::types::{QueryOutput, Row, Shaped, SqlValue};

/// Liveness probe run once on connect.
const PROBE_SQL: &str = r#"SELECT CURRENT_TIMESTAMP AS "currentTime", $1 AS db"#;

static INSTANCE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Main entry point for dbrelay.
/// Holds the driver and runs commands, raw queries, and transactions.
#[derive(Clone)]
pub struct DbRelay {
    driver: Arc<dyn DatabaseDriver>,
    id: Arc<str>,
    database: Option<String>,
    debug: bool,
}

impl DbRelay {
    /// Open a PostgreSQL pool described by `config`.
    ///
    /// A liveness probe is spawned in the background; its outcome is only
    /// logged. Call [`DbRelay::ping`] to fail fast on an unreachable database.
    ///
    /// # Example
    /// ```ignore
    /// let relay = DbRelay::connect(RelayConfig::from_url("postgres://localhost/shop")?).await?;
    /// ```
    pub async fn connect(config: RelayConfig) -> Result<Self> {
        config.validate()?;
        let driver = TokioPostgresDriver::connect(&config)?;
        let relay = Self::with_driver(Arc::new(driver), &config);

        let probe = relay.clone();
        tokio::spawn(async move {
            match probe.ping().await {
                Ok(row) => info!(
                    relay = %probe.id,
                    db = %row.get("db").unwrap_or(&serde_json::Value::Null),
                    remote_time = %row.get("currentTime").unwrap_or(&serde_json::Value::Null),
                    "connected"
                ),
                Err(e) => warn!(relay = %probe.id, error = %e, "liveness probe failed"),
            }
        });

        Ok(relay)
    }

    /// Create a relay over a custom driver.
    /// Useful for testing or using alternative database drivers. No probe runs.
    pub fn with_driver(driver: Arc<dyn DatabaseDriver>, config: &RelayConfig) -> Self {
        let seq = INSTANCE_SEQ.fetch_add(1, Ordering::Relaxed);
        Self {
            driver,
            id: format!("{}:{}", std::process::id(), seq).into(),
            database: config.database.clone(),
            debug: config.debug,
        }
    }

    /// Instance identity used in log lines: `<pid>:<sequence>`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Run the liveness probe and return its `currentTime` and `db` columns.
    pub async fn ping(&self) -> Result<Row> {
        let database = SqlValue::from(self.database.clone());
        let output = self.query(PROBE_SQL, &[database], None).await?;
        Ok(output.rows.into_iter().next().unwrap_or_default())
    }

    /// Bind `values` into `sql` and run it on `handle`, or on the pool when `None`.
    pub async fn query(
        &self,
        sql: &str,
        values: &[SqlValue],
        handle: Option<&ConnectionHandle>,
    ) -> Result<QueryOutput> {
        if self.debug {
            debug!(relay = %self.id, sql, ?values, "query");
        }
        let bound = bind_params(sql, values, |value| self.driver.escape(value))?;

        let raw = match handle {
            Some(conn) => conn.query(&bound).await,
            None => self.driver.query(&bound).await,
        };
        let output = raw.and_then(materialize);
        if let Err(e) = &output {
            if self.debug {
                debug!(relay = %self.id, sql = %bound, error = %e, "query failed");
            }
        }
        output
    }

    /// Lease a dedicated connection from the pool.
    pub async fn get_connection(&self) -> Result<ConnectionHandle> {
        let conn = self.driver.get_connection().await?;
        Ok(ConnectionHandle::new(conn))
    }

    /// Render, run, and shape `command`.
    pub async fn execute(
        &self,
        command: &Command,
        handle: Option<&ConnectionHandle>,
    ) -> Result<Shaped> {
        let (sql, values) = command.to_params();
        let output = self.query(&sql, &values, handle).await?;
        shape(command, output)
    }

    pub(crate) fn log_debug(&self, message: &str) {
        if self.debug {
            debug!(relay = %self.id, "{message}");
        }
    }
}

impl std::fmt::Debug for DbRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbRelay")
            .field("id", &self.id)
            .field("database", &self.database)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}
