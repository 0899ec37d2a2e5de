use anyhow::Result;
use chrono::{DateTime, Local};
use clap::ArgMatches;

use toolkit::command::{Command, DependencyGate};
use toolkit::config::ToolkitConfig;

use super::{LOG_FILES_GATE, find_log_files};

pub struct ListLogsCommand {
    config: ToolkitConfig,
}

impl ListLogsCommand {
    pub fn new(config: ToolkitConfig) -> Self {
        Self { config }
    }
}

impl Command for ListLogsCommand {
    fn name(&self) -> &str {
        "list"
    }

    fn description(&self) -> &str {
        "List log files"
    }

    fn help(&self) -> &str {
        "List the rotated log files in the configured log directory, newest first."
    }

    fn arguments(&self, parser: clap::Command) -> clap::Command {
        parser
    }

    fn run(&self, _args: &ArgMatches) -> Result<()> {
        let logging = self.config.logging();
        let files = find_log_files(&logging.dir, &logging.file)?;

        if files.is_empty() {
            println!("No log files in {}", logging.dir.display());
            return Ok(());
        }

        println!();
        println!(
            "{} {}",
            console::style("Log files in").bold(),
            console::style(logging.dir.display()).cyan()
        );
        println!();
        for file in &files {
            let modified: DateTime<Local> = file.modified.into();
            println!(
                "  {:<32} {:>10}  {}",
                file.name,
                format_size(file.size),
                console::style(modified.format("%Y-%m-%d %H:%M:%S")).dim()
            );
        }
        println!();
        Ok(())
    }

    fn gate(&self) -> Option<DependencyGate> {
        Some(LOG_FILES_GATE)
    }
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
