pub mod command;
pub mod config;
pub mod errors;
pub mod logging;

pub use command::{Command, CommandEntry, CommandManager, DependencyGate};
