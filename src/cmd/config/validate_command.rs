use anyhow::Result;
use clap::ArgMatches;

use toolkit::command::Command;
use toolkit::config::ToolkitConfig;

pub struct ValidateConfigCommand {
    config: ToolkitConfig,
}

impl ValidateConfigCommand {
    pub fn new(config: ToolkitConfig) -> Self {
        Self { config }
    }
}

impl Command for ValidateConfigCommand {
    fn name(&self) -> &str {
        "validate"
    }

    fn description(&self) -> &str {
        "Check the configuration for problems"
    }

    fn help(&self) -> &str {
        "Check the effective configuration and list any warnings. Values that \
         cannot be parsed at all are reported before any command runs."
    }

    fn arguments(&self, parser: clap::Command) -> clap::Command {
        parser
    }

    fn run(&self, _args: &ArgMatches) -> Result<()> {
        println!();
        println!("Validating configuration...");
        println!();

        if self.config.source.is_none() {
            println!("No toolkit.toml found. Checking defaults and environment.");
        }

        let warnings = self.config.validate();
        if warnings.is_empty() {
            println!("{}", console::style("Configuration is valid.").green());
        } else {
            println!("{}", console::style("Configuration warnings:").yellow());
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
        println!();
        Ok(())
    }
}
