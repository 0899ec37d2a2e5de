//! Configuration for the toolkit.
//!
//! Settings are read from `toolkit.toml`, then overridden by environment
//! variables (a `.env` file is loaded by the binary before this runs).
//!
//! # Configuration File Format
//!
//! ```toml
//! [logging]
//! dir = "logs"
//! file = "toolkit.log"
//! level = "info"          # debug | info | warning | error | critical
//! output = "console"      # console | file | both
//! retention_hours = 24
//! use_filter = false
//! json = false
//! ```
//!
//! | Variable              | Overrides                   |
//! |-----------------------|-----------------------------|
//! | `LOG_DIR`             | `logging.dir`               |
//! | `LOG_FILE`            | `logging.file`              |
//! | `LOG_LEVEL`           | `logging.level`             |
//! | `LOG_OUTPUT`          | `logging.output`            |
//! | `LOG_RETENTION_HOURS` | `logging.retention_hours`   |
//! | `USE_FILTER`          | `logging.use_filter`        |

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::ConfigError;

pub const CONFIG_FILE_NAME: &str = "toolkit.toml";

/// Log verbosity. `Critical` is accepted for compatibility and logs as error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn as_tracing(self) -> tracing::Level {
        match self {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warning => tracing::Level::WARN,
            LogLevel::Error | LogLevel::Critical => tracing::Level::ERROR,
        }
    }

    /// `EnvFilter` directive for this level.
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warning => write!(f, "warning"),
            LogLevel::Error => write!(f, "error"),
            LogLevel::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warning" | "warn" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            "critical" => Ok(LogLevel::Critical),
            _ => Err(ConfigError::InvalidValue {
                variable: "LOG_LEVEL".to_string(),
                value: s.to_string(),
                expected: "'DEBUG', 'INFO', 'WARNING', 'ERROR', 'CRITICAL'".to_string(),
            }),
        }
    }
}

/// Where log records are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Console,
    File,
    Both,
}

impl LogOutput {
    pub fn to_console(self) -> bool {
        matches!(self, LogOutput::Console | LogOutput::Both)
    }

    pub fn to_file(self) -> bool {
        matches!(self, LogOutput::File | LogOutput::Both)
    }
}

impl std::fmt::Display for LogOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogOutput::Console => write!(f, "console"),
            LogOutput::File => write!(f, "file"),
            LogOutput::Both => write!(f, "both"),
        }
    }
}

impl std::str::FromStr for LogOutput {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "console" => Ok(LogOutput::Console),
            "file" => Ok(LogOutput::File),
            "both" => Ok(LogOutput::Both),
            _ => Err(ConfigError::InvalidValue {
                variable: "LOG_OUTPUT".to_string(),
                value: s.to_string(),
                expected: "'console', 'file', 'both'".to_string(),
            }),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Directory for log files
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
    /// Log file name; rotated files get an hourly suffix
    #[serde(default = "default_log_file")]
    pub file: String,
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub output: LogOutput,
    /// How many hourly log files to keep (0 keeps all)
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u32,
    /// Only emit records of exactly `level`
    #[serde(default)]
    pub use_filter: bool,
    /// Write the log file as JSON lines
    #[serde(default)]
    pub json: bool,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_file() -> String {
    "toolkit.log".to_string()
}

fn default_retention_hours() -> u32 {
    24
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            file: default_log_file(),
            level: LogLevel::default(),
            output: LogOutput::default(),
            retention_hours: default_retention_hours(),
            use_filter: false,
            json: false,
        }
    }
}

/// Parsed `toolkit.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolkitToml {
    #[serde(default)]
    pub logging: LoggingSection,
}

impl ToolkitToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse toolkit.toml")
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize toolkit.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Apply environment overrides, reading variables through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let logging = &mut self.logging;
        if let Some(dir) = lookup("LOG_DIR") {
            logging.dir = PathBuf::from(dir);
        }
        if let Some(file) = lookup("LOG_FILE") {
            logging.file = file;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            logging.level = level.parse()?;
        }
        if let Some(output) = lookup("LOG_OUTPUT") {
            logging.output = output.parse()?;
        }
        if let Some(hours) = lookup("LOG_RETENTION_HOURS") {
            logging.retention_hours =
                hours
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        variable: "LOG_RETENTION_HOURS".to_string(),
                        value: hours.clone(),
                        expected: "a non-negative integer".to_string(),
                    })?;
        }
        if let Some(flag) = lookup("USE_FILTER") {
            logging.use_filter = match flag.to_lowercase().as_str() {
                "true" => true,
                "false" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        variable: "USE_FILTER".to_string(),
                        value: flag,
                        expected: "'true', 'false'".to_string(),
                    });
                }
            };
        }
        Ok(())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let logging = &self.logging;

        if logging.output.to_file() && !cfg!(feature = "file-logging") {
            warnings.push(format!(
                "Log output '{}' needs the 'file-logging' feature; logging to console only",
                logging.output
            ));
        }
        if logging.file.trim().is_empty() {
            warnings.push("logging.file is empty".to_string());
        }
        if logging.retention_hours == 0 {
            warnings.push("logging.retention_hours = 0 keeps every rotated log file".to_string());
        }
        if logging.use_filter && logging.level == LogLevel::Critical {
            warnings.push(
                "use_filter with level 'critical' also emits 'error' records (no separate critical level)"
                    .to_string(),
            );
        }
        if logging.json && !logging.output.to_file() {
            warnings.push("logging.json only applies to file output".to_string());
        }

        warnings
    }
}

/// Resolved configuration: the file (if any) plus environment overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolkitConfig {
    /// The file the settings were read from, if one was found
    pub source: Option<PathBuf>,
    pub toml: ToolkitToml,
}

impl ToolkitConfig {
    /// Locate and load the configuration, applying process environment overrides.
    pub fn load() -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        let explicit = std::env::var_os("TOOLKIT_CONFIG").map(PathBuf::from);
        let source = find_config_file(explicit, &cwd, dirs::config_dir());
        Self::from_source(source, |name| std::env::var(name).ok())
    }

    /// Load from `source` (defaults when `None`) and apply overrides from `lookup`.
    pub fn from_source<F>(source: Option<PathBuf>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut toml = match &source {
            Some(path) => ToolkitToml::load(path)?,
            None => ToolkitToml::default(),
        };
        toml.apply_env_overrides(lookup)?;
        Ok(Self { source, toml })
    }

    pub fn logging(&self) -> &LoggingSection {
        &self.toml.logging
    }

    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }
}

/// Config file lookup order: explicit path, `./toolkit.toml`,
/// `<config_dir>/toolkit/toolkit.toml`.
pub fn find_config_file(
    explicit: Option<PathBuf>,
    cwd: &Path,
    config_dir: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path);
    }
    let local = cwd.join(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    config_dir
        .map(|dir| dir.join("toolkit").join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file())
}
