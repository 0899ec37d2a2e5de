//! The capability contract every toolkit command implements.

use anyhow::Result;
use clap::ArgMatches;

use super::optional::DependencyGate;

/// A pluggable CLI command.
///
/// The registry treats every implementation uniformly: `name` is the
/// subcommand token, `description` is the one-line summary shown in the
/// parent's listing, `help` is the long form shown by `<command> --help`,
/// `arguments` registers flags onto the command's parser and `run` executes
/// with the parsed values. A command reports failure by returning `Err`; the
/// binary turns that into a non-zero exit code.
///
/// Commands that need optional cargo features override [`Command::gate`].
pub trait Command {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn help(&self) -> &str;

    fn arguments(&self, parser: clap::Command) -> clap::Command;

    fn run(&self, args: &ArgMatches) -> Result<()>;

    /// Dependencies that must be available for this command to be registered.
    fn gate(&self) -> Option<DependencyGate> {
        None
    }
}

/// Build the child parser for `command`: name, summary and long help, then
/// whatever flags the command declares.
pub fn register_command(command: &dyn Command) -> clap::Command {
    let parser = clap::Command::new(command.name().to_string())
        .about(command.description().to_string())
        .long_about(command.help().to_string());
    command.arguments(parser)
}
