//! `toolkit logs`: inspect rotated log files.
//!
//! Log files only exist when file logging is compiled in, so both commands
//! are gated on the `file-logging` feature.

pub mod list_command;
pub mod show_command;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use walkdir::WalkDir;

use toolkit::command::DependencyGate;

pub const LOG_FILES_GATE: DependencyGate =
    DependencyGate::new("file-logging", &["tracing_appender"]);

/// A rotated log file in the log directory.
#[derive(Debug, Clone)]
pub struct LogFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub modified: SystemTime,
}

/// Log files in `dir` whose name starts with `prefix`, newest first.
///
/// A missing directory yields an empty list.
pub fn find_log_files(dir: &Path, prefix: &str) -> Result<Vec<LogFile>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("Failed to read {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.starts_with(prefix) {
            continue;
        }
        let metadata = entry
            .metadata()
            .with_context(|| format!("Failed to stat {}", entry.path().display()))?;
        files.push(LogFile {
            path: entry.path().to_path_buf(),
            name,
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        });
    }

    files.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.name.cmp(&a.name)));
    Ok(files)
}
