use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgMatches, Args, FromArgMatches};

use toolkit::command::Command;
use toolkit::config::{CONFIG_FILE_NAME, ToolkitToml};

#[derive(Debug, Args)]
struct InitArgs {
    /// Where to write the file (defaults to ./toolkit.toml)
    #[arg(long)]
    path: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
}

#[derive(Debug, Default)]
pub struct InitConfigCommand;

impl Command for InitConfigCommand {
    fn name(&self) -> &str {
        "init"
    }

    fn description(&self) -> &str {
        "Create a default toolkit.toml"
    }

    fn help(&self) -> &str {
        "Write a toolkit.toml with the default settings. An existing file is \
         left untouched unless --force is given."
    }

    fn arguments(&self, parser: clap::Command) -> clap::Command {
        InitArgs::augment_args(parser)
    }

    fn run(&self, args: &ArgMatches) -> Result<()> {
        let args = InitArgs::from_arg_matches(args)?;
        let path = args
            .path
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

        if path.exists() && !args.force {
            println!("{} already exists at {}", CONFIG_FILE_NAME, path.display());
            println!("Use --force to overwrite it.");
            return Ok(());
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        ToolkitToml::default().save(&path)?;
        tracing::info!("Wrote default configuration to {}", path.display());

        println!("Created {} at {}", CONFIG_FILE_NAME, path.display());
        println!();
        println!("You can now customize:");
        println!("  - [logging] dir, file, level, output");
        println!("  - [logging] retention_hours, use_filter, json");
        println!();
        Ok(())
    }
}
