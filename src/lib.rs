//! dbrelay - command execution and result shaping over a pooled SQL driver
//!
//! # Example
//! ```ignore
//! use dbrelay::{DbRelay, RelayConfig, WhereClause};
//!
//! // Connect to database
//! let relay = DbRelay::connect(RelayConfig::from_url("postgres://localhost/shop")?).await?;
//!
//! // Fetch one user with its address folded into a nested object
//! let user = relay
//!     .get("users")
//!     .columns(&["id", "name", "addr_city", "addr_zip"])
//!     .where_(WhereClause::eq("id", 7))
//!     .group("address", &[("addr_city", "city"), ("addr_zip", "zip")])
//!     .execute(None)
//!     .await?
//!     .into_row();
//!
//! // Count rows
//! let total = relay.count("users").execute(None).await?.count();
//! ```

pub mod binder;
pub mod builders;
pub mod clauses;
pub mod coercion;
pub mod config;
pub mod drivers;
pub mod error;
pub mod normalize;
pub mod traits;
pub mod types;

mod client;
mod connection;
mod dispatch;
mod transaction;

// Re-export main types for convenient access
pub use builders::{ColumnGroup, Command, CommandKind};
pub use clauses::WhereClause;
pub use client::DbRelay;
pub use config::RelayConfig;
pub use connection::ConnectionHandle;
pub use dispatch::Executable;
pub use error::{DbRelayError, Result};
pub use traits::{DatabaseDriver, DriverConnection};
pub use transaction::{TransactionState, WorkFuture};
pub use types::{ColumnType, FieldMeta, QueryOutput, RawQueryResult, Row, Shaped, SqlValue};
