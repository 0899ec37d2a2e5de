//! `toolkit commands`: list every registered command.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgMatches, Args, FromArgMatches};

use toolkit::command::{Availability, Command, CommandManager};
use toolkit::config::ToolkitConfig;

#[derive(Debug, Args)]
struct CommandsArgs {
    /// Print the command tree as JSON
    #[arg(long)]
    json: bool,
}

pub struct CommandsCommand {
    config: ToolkitConfig,
    /// The same availability the dispatching registry was built with
    availability: Arc<Availability>,
}

impl CommandsCommand {
    pub fn new(config: ToolkitConfig, availability: Arc<Availability>) -> Self {
        Self {
            config,
            availability,
        }
    }

    // Listing runs inside dispatch, so it loads its own copy of the tree.
    fn loaded_manager(&self) -> Result<CommandManager> {
        let mut manager = super::command_manager(&self.config, Arc::clone(&self.availability));
        manager.load_commands()?;
        Ok(manager)
    }
}

impl Command for CommandsCommand {
    fn name(&self) -> &str {
        "commands"
    }

    fn description(&self) -> &str {
        "List available commands"
    }

    fn help(&self) -> &str {
        "List every command this build registers, grouped by namespace. \
         Commands whose optional dependencies are not compiled in are omitted."
    }

    fn arguments(&self, parser: clap::Command) -> clap::Command {
        CommandsArgs::augment_args(parser)
    }

    fn run(&self, args: &ArgMatches) -> Result<()> {
        let args = CommandsArgs::from_arg_matches(args)?;

        let manager = self.loaded_manager()?;

        if args.json {
            let summary = manager.hierarchy().summary();
            let json = serde_json::to_string_pretty(&summary)
                .context("Failed to serialize command tree")?;
            println!("{}", json);
        } else {
            println!();
            println!("{}", console::style("Available commands").bold().cyan());
            println!();
            print!("{}", manager.hierarchy().render_tree());
            println!();
        }
        Ok(())
    }
}
