use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::{ArgMatches, Args, FromArgMatches};

use toolkit::command::{Command, DependencyGate};
use toolkit::config::ToolkitConfig;

use super::{LOG_FILES_GATE, find_log_files};

#[derive(Debug, Args)]
struct ShowArgs {
    /// Log file name as printed by `toolkit logs list` (defaults to the newest)
    file: Option<String>,

    /// Only print the last N lines
    #[arg(long, short = 'n')]
    tail: Option<usize>,
}

pub struct ShowLogCommand {
    config: ToolkitConfig,
}

impl ShowLogCommand {
    pub fn new(config: ToolkitConfig) -> Self {
        Self { config }
    }
}

impl Command for ShowLogCommand {
    fn name(&self) -> &str {
        "show"
    }

    fn description(&self) -> &str {
        "Print a log file"
    }

    fn help(&self) -> &str {
        "Print a log file from the configured log directory. Without a file \
         name the newest log file is shown."
    }

    fn arguments(&self, parser: clap::Command) -> clap::Command {
        ShowArgs::augment_args(parser)
    }

    fn run(&self, args: &ArgMatches) -> Result<()> {
        let args = ShowArgs::from_arg_matches(args)?;
        let logging = self.config.logging();

        let path = match args.file {
            Some(name) => {
                check_file_name(&name)?;
                logging.dir.join(name)
            }
            None => match find_log_files(&logging.dir, &logging.file)?.into_iter().next() {
                Some(newest) => newest.path,
                None => bail!("No log files in {}", logging.dir.display()),
            },
        };

        print!("{}", read_lines(&path, args.tail)?);
        Ok(())
    }

    fn gate(&self) -> Option<DependencyGate> {
        Some(LOG_FILES_GATE)
    }
}

/// Only bare file names inside the log directory are accepted.
fn check_file_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || Path::new(name).components().count() != 1
    {
        bail!("Invalid log file name '{}': expected a file in the log directory", name);
    }
    Ok(())
}

fn read_lines(path: &Path, tail: Option<usize>) -> Result<String> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read log file: {}", path.display()))?;
    let Some(count) = tail else {
        return Ok(content);
    };

    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(count);
    let mut out = lines[start..].join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    Ok(out)
}
