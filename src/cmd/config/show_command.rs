use anyhow::{Context, Result};
use clap::ArgMatches;

use toolkit::command::Command;
use toolkit::config::ToolkitConfig;

pub struct ShowConfigCommand {
    config: ToolkitConfig,
}

impl ShowConfigCommand {
    pub fn new(config: ToolkitConfig) -> Self {
        Self { config }
    }

    fn render(&self) -> Result<String> {
        toml::to_string_pretty(&self.config.toml).context("Failed to serialize configuration")
    }
}

impl Command for ShowConfigCommand {
    fn name(&self) -> &str {
        "show"
    }

    fn description(&self) -> &str {
        "Show the effective configuration"
    }

    fn help(&self) -> &str {
        "Print where the configuration was loaded from and the effective \
         settings after environment overrides (LOG_DIR, LOG_FILE, LOG_LEVEL, \
         LOG_OUTPUT, LOG_RETENTION_HOURS, USE_FILTER)."
    }

    fn arguments(&self, parser: clap::Command) -> clap::Command {
        parser
    }

    fn run(&self, _args: &ArgMatches) -> Result<()> {
        println!();
        println!("{}", console::style("Toolkit Configuration").bold().cyan());
        println!();

        match &self.config.source {
            Some(path) => println!("Config file: {}", path.display()),
            None => {
                println!("No toolkit.toml found, using defaults.");
                println!("Run 'toolkit config init' to create one.");
            }
        }
        println!();
        println!("Effective values (with env overrides):");
        println!();
        print!("{}", self.render()?);
        println!();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn render_includes_env_overrides() {
        let env: HashMap<&str, &str> = [("LOG_LEVEL", "debug"), ("LOG_OUTPUT", "both")].into();
        let config =
            ToolkitConfig::from_source(None, |name: &str| env.get(name).map(|v| v.to_string()))
                .unwrap();
        let rendered = ShowConfigCommand::new(config).render().unwrap();
        assert!(rendered.contains("[logging]"));
        assert!(rendered.contains("level = \"debug\""));
        assert!(rendered.contains("output = \"both\""));
    }
}
