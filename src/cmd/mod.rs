//! Built-in commands.
//!
//! A command's namespace is the module directory it lives in, relative to
//! this module; the file name itself does not appear on the command line.
//!
//! | Module                   | Command line              |
//! |--------------------------|---------------------------|
//! | `commands_command`       | `toolkit commands`        |
//! | `config::show_command`   | `toolkit config show`     |
//! | `config::validate_command` | `toolkit config validate` |
//! | `config::init_command`   | `toolkit config init`     |
//! | `logs::list_command`     | `toolkit logs list`       |
//! | `logs::show_command`     | `toolkit logs show`       |

pub mod commands_command;
pub mod config;
pub mod logs;

use std::sync::Arc;

use toolkit::command::{Availability, Command, CommandEntry, CommandManager};
use toolkit::config::ToolkitConfig;

/// Module path every built-in command is placed relative to.
pub const COMMAND_ROOT: &str = module_path!();

/// Every command this binary ships, in help-listing order.
pub fn manifest(config: &ToolkitConfig, availability: &Arc<Availability>) -> Vec<CommandEntry> {
    let listing = Arc::clone(availability);
    vec![
        with_config(config, move |config| {
            commands_command::CommandsCommand::new(config, Arc::clone(&listing))
        }),
        with_config(config, config::show_command::ShowConfigCommand::new),
        with_config(config, config::validate_command::ValidateConfigCommand::new),
        CommandEntry::of::<config::init_command::InitConfigCommand>(),
        with_config(config, logs::list_command::ListLogsCommand::new),
        with_config(config, logs::show_command::ShowLogCommand::new),
    ]
}

/// The registry for this binary. `availability` decides which gated commands
/// register, both here and in the `commands` listing.
pub fn command_manager(config: &ToolkitConfig, availability: Arc<Availability>) -> CommandManager {
    CommandManager::new(COMMAND_ROOT, manifest(config, &availability))
        .with_program("toolkit", "toolkit CLI - A command-line toolkit")
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_availability(availability)
}

fn with_config<T, F>(config: &ToolkitConfig, build: F) -> CommandEntry
where
    T: Command + 'static,
    F: Fn(ToolkitConfig) -> T + 'static,
{
    let config = config.clone();
    CommandEntry::from_fn(move || Ok(build(config.clone())))
}
