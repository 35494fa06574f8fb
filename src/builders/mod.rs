mod command;

pub use command::{ColumnGroup, Command, CommandData, CommandKind, ValueSet};
