//! Command contract, optional-dependency gating and the command registry.
//!
//! | Module         | Contents                                              |
//! |----------------|-------------------------------------------------------|
//! | `base`         | `Command` trait and `register_command`                |
//! | `dependencies` | `DependencyProbe`, `Availability`, `require_optional` |
//! | `optional`     | `DependencyGate` for feature-gated commands           |
//! | `hierarchy`    | Namespace tree of registered commands                 |
//! | `manager`      | `CommandManager`: discovery, parser build, dispatch   |

pub mod base;
pub mod dependencies;
pub mod hierarchy;
pub mod manager;
pub mod optional;

pub use base::{Command, register_command};
pub use dependencies::{Availability, CompiledFeatures, DependencyProbe, require_optional};
pub use hierarchy::{CommandDescriptor, Hierarchy, Node};
pub use manager::{CommandEntry, CommandManager, LoadReport, SkipReason, SkippedCommand};
pub use optional::DependencyGate;
