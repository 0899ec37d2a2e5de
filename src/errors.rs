//! Typed error hierarchy for the toolkit.
//!
//! One enum per subsystem:
//! - `CommandManagerError`: command discovery and parser compilation
//! - `ConfigError`: invalid configuration values
//! - `OptionalDependencyError`: a gated dependency that is not compiled in
//!
//! Every error exposes structured diagnostics through [`WithMetadata`].

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Ordered key/value diagnostics attached to an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorMetadata(BTreeMap<String, String>);

impl ErrorMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ErrorMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}={v}")).collect();
        write!(f, "{}", rendered.join(", "))
    }
}

/// Common base for toolkit errors: a message plus arbitrary metadata.
pub trait WithMetadata: std::error::Error {
    fn metadata(&self) -> ErrorMetadata;

    /// `"<message> | Metadata: k=v, ..."`, the form written to the logs.
    fn describe(&self) -> String {
        let metadata = self.metadata();
        if metadata.is_empty() {
            self.to_string()
        } else {
            format!("{} | Metadata: {}", self, metadata)
        }
    }
}

/// Errors from command discovery and parser compilation.
#[derive(Debug, Error)]
pub enum CommandManagerError {
    #[error("Failed to import module '{module_path}'")]
    ModuleImport {
        module_path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to load command from module '{module_name}': {reason}")]
    CommandLoad { module_name: String, reason: String },

    #[error("Duplicate command detected: '{command_name}'")]
    HierarchyConflict {
        command_name: String,
        path: Vec<String>,
    },

    #[error("{message}")]
    ParserBuild {
        message: String,
        substructure: String,
    },
}

impl CommandManagerError {
    /// Fatal errors abort discovery; the rest are logged and skipped.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CommandManagerError::HierarchyConflict { .. } | CommandManagerError::ParserBuild { .. }
        )
    }
}

impl WithMetadata for CommandManagerError {
    fn metadata(&self) -> ErrorMetadata {
        match self {
            CommandManagerError::ModuleImport {
                module_path,
                source,
            } => ErrorMetadata::new()
                .with("module_path", module_path)
                .with("original_error", format!("{source:#}")),
            CommandManagerError::CommandLoad {
                module_name,
                reason,
            } => ErrorMetadata::new()
                .with("module_name", module_name)
                .with("reason", reason),
            CommandManagerError::HierarchyConflict { command_name, path } => ErrorMetadata::new()
                .with("command_name", command_name)
                .with("path", path.join(" ")),
            CommandManagerError::ParserBuild { substructure, .. } => {
                ErrorMetadata::new().with("substructure", substructure)
            }
        }
    }
}

/// Errors from loading and validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {variable}: '{value}'. Must be one of {expected}.")]
    InvalidValue {
        variable: String,
        value: String,
        expected: String,
    },

    #[error("Failed to read config file at {path}: {source}")]
    ReadFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    ParseFailed {
        path: std::path::PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl WithMetadata for ConfigError {
    fn metadata(&self) -> ErrorMetadata {
        match self {
            ConfigError::InvalidValue {
                variable, value, ..
            } => ErrorMetadata::new()
                .with("variable", variable)
                .with("value", value),
            ConfigError::ReadFailed { path, .. } | ConfigError::ParseFailed { path, .. } => {
                ErrorMetadata::new().with("path", path.display())
            }
        }
    }
}

/// A module required by an optional dependency group is not available.
#[derive(Debug, Error)]
#[error(
    "Optional dependency '{name}' is not installed.\n\nInstall with: cargo install toolkit --features {group}"
)]
pub struct OptionalDependencyError {
    pub name: String,
    pub group: String,
}

impl WithMetadata for OptionalDependencyError {
    fn metadata(&self) -> ErrorMetadata {
        ErrorMetadata::new()
            .with("name", &self.name)
            .with("group", &self.group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_import_carries_path_and_cause() {
        let err = CommandManagerError::ModuleImport {
            module_path: "toolkit::cmd::jira::velocity".into(),
            source: anyhow::anyhow!("missing JIRA_URL"),
        };
        let metadata = err.metadata();
        assert_eq!(metadata.get("module_path"), Some("toolkit::cmd::jira::velocity"));
        assert_eq!(metadata.get("original_error"), Some("missing JIRA_URL"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn hierarchy_conflict_names_duplicate() {
        let err = CommandManagerError::HierarchyConflict {
            command_name: "report".into(),
            path: vec!["jira".into()],
        };
        assert!(err.to_string().contains("'report'"));
        assert!(err.is_fatal());
        assert_eq!(err.metadata().get("path"), Some("jira"));
    }

    #[test]
    fn parser_build_is_fatal_and_keeps_subtree() {
        let err = CommandManagerError::ParserBuild {
            message: "Failed to add subparser for jira".into(),
            substructure: "jira\n  report".into(),
        };
        assert!(err.is_fatal());
        assert_eq!(err.metadata().get("substructure"), Some("jira\n  report"));
    }

    #[test]
    fn describe_appends_metadata() {
        let err = CommandManagerError::CommandLoad {
            module_name: "toolkit::cmd::bad".into(),
            reason: "invalid name".into(),
        };
        let described = err.describe();
        assert!(described.starts_with("Failed to load command from module"));
        assert!(described.contains("| Metadata: module_name=toolkit::cmd::bad, reason=invalid name"));
    }

    #[test]
    fn metadata_display_is_ordered() {
        let metadata = ErrorMetadata::new().with("b", 2).with("a", 1);
        assert_eq!(metadata.to_string(), "a=1, b=2");
    }

    #[test]
    fn config_error_lists_expected_values() {
        let err = ConfigError::InvalidValue {
            variable: "LOG_OUTPUT".into(),
            value: "syslog".into(),
            expected: "'console', 'file', 'both'".into(),
        };
        assert!(err.to_string().contains("LOG_OUTPUT"));
        assert!(err.to_string().contains("'console', 'file', 'both'"));
        assert_eq!(err.metadata().get("value"), Some("syslog"));
    }

    #[test]
    fn optional_dependency_error_has_install_hint() {
        let err = OptionalDependencyError {
            name: "tracing_appender".into(),
            group: "file-logging".into(),
        };
        assert!(err.to_string().contains("--features file-logging"));
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&CommandManagerError::CommandLoad {
            module_name: "x".into(),
            reason: "y".into(),
        });
        assert_std_error(&OptionalDependencyError {
            name: "x".into(),
            group: "y".into(),
        });
    }
}
