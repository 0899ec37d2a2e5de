//! Dependency gate for commands that need optional cargo features.

use super::dependencies::Availability;

/// Declares the optional dependency group a command needs.
///
/// A gated command is only registered when every module in `modules` is
/// available. Otherwise it is left out of the command tree entirely and a
/// single warning tells the user which feature to enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyGate {
    pub group: &'static str,
    pub modules: &'static [&'static str],
}

impl DependencyGate {
    pub const fn new(group: &'static str, modules: &'static [&'static str]) -> Self {
        Self { group, modules }
    }

    pub fn is_available(&self, availability: &Availability) -> bool {
        self.modules.is_empty() || availability.all_available(self.modules)
    }

    pub fn install_hint(&self) -> String {
        format!("cargo install toolkit --features {}", self.group)
    }

    /// Like `is_available`, but warns when the command has to be skipped.
    pub fn can_register(&self, command_name: &str, availability: &Availability) -> bool {
        let available = self.is_available(availability);
        if !available {
            tracing::warn!(
                command = command_name,
                group = self.group,
                "Command '{}' requires optional dependencies '{}' and will be skipped. Install with: {}",
                command_name,
                self.group,
                self.install_hint()
            );
        }
        available
    }
}
