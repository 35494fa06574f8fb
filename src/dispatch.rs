//! Binds builder commands to a relay so they can be executed in place.

use crate::builders::Command;
use crate::client::DbRelay;
use crate::clauses::WhereClause;
use crate::connection::ConnectionHandle;
use crate::error::Result;
use crate::types::{Shaped, SqlValue};

/// A command bound to the relay that will run it.
///
/// Builder methods are forwarded to the wrapped [`Command`], so a chain can
/// start from the relay and end with `execute`.
#[derive(Debug, Clone)]
pub struct Executable<'r> {
    relay: &'r DbRelay,
    command: Command,
}

macro_rules! forward_builder {
    ($( $(#[$meta:meta])* fn $name:ident($($arg:ident: $ty:ty),*); )*) => {
        $(
            $(#[$meta])*
            pub fn $name(self, $($arg: $ty),*) -> Self {
                Self {
                    relay: self.relay,
                    command: self.command.$name($($arg),*),
                }
            }
        )*
    };
}

impl<'r> Executable<'r> {
    forward_builder! {
        fn columns(cols: &[&str]);
        fn where_(clause: WhereClause);
        fn group(name: &str, columns: &[(&str, &str)]);
        fn returning(cols: &[&str]);
        fn order_by(column: &str);
        fn order_by_desc(column: &str);
        fn limit(n: u64);
        fn offset(n: u64);
    }

    /// Assign `column = value` in an UPDATE.
    pub fn set<V: Into<SqlValue>>(self, column: &str, value: V) -> Self {
        Self {
            relay: self.relay,
            command: self.command.set(column, value),
        }
    }

    /// Add one row of values to an INSERT.
    pub fn values<K, V>(self, row: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<SqlValue>,
    {
        Self {
            relay: self.relay,
            command: self.command.values(row),
        }
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn into_command(self) -> Command {
        self.command
    }

    /// Render the SQL template and its bind values.
    pub fn to_params(&self) -> (String, Vec<SqlValue>) {
        self.command.to_params()
    }

    /// Run on `handle`, or on the pool when `None`, and shape the result.
    pub async fn execute(self, handle: Option<&ConnectionHandle>) -> Result<Shaped> {
        self.relay.execute(&self.command, handle).await
    }
}

impl DbRelay {
    /// Bind any builder command to this relay.
    pub fn wrap(&self, command: Command) -> Executable<'_> {
        Executable {
            relay: self,
            command,
        }
    }

    pub fn select(&self, table: &str) -> Executable<'_> {
        self.wrap(Command::select(table))
    }

    pub fn get(&self, table: &str) -> Executable<'_> {
        self.wrap(Command::get(table))
    }

    pub fn count(&self, table: &str) -> Executable<'_> {
        self.wrap(Command::count(table))
    }

    pub fn insert(&self, table: &str) -> Executable<'_> {
        self.wrap(Command::insert(table))
    }

    pub fn insert_into(&self, table: &str, columns: &[&str], source: Command) -> Executable<'_> {
        self.wrap(Command::insert_into(table, columns, source))
    }

    pub fn update(&self, table: &str) -> Executable<'_> {
        self.wrap(Command::update(table))
    }

    pub fn delete(&self, table: &str) -> Executable<'_> {
        self.wrap(Command::delete(table))
    }
}
