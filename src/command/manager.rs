//! Command registry and dispatcher.
//!
//! `CommandManager` takes an explicit manifest of [`CommandEntry`] values,
//! builds the namespace [`Hierarchy`] from their module paths, compiles it
//! into a nested `clap::Command` and dispatches parsed arguments to the
//! selected command.
//!
//! Discovery is best effort: a constructor that fails or a command with a
//! bad name is logged and skipped. A naming conflict in the tree is fatal.

use std::collections::HashSet;
use std::ffi::OsString;
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::ArgMatches;
use tracing::Span;

use super::base::{Command, register_command};
use super::dependencies::Availability;
use super::hierarchy::{CommandDescriptor, Hierarchy, Node};
use crate::errors::{CommandManagerError, WithMetadata};

type Factory = Box<dyn Fn() -> Result<Box<dyn Command>>>;

/// One row of the command manifest: where the command lives and how to build it.
pub struct CommandEntry {
    module: String,
    factory: Factory,
}

impl CommandEntry {
    /// Entry with an explicit module path.
    pub fn new<F>(module: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn Command>> + 'static,
    {
        Self {
            module: module.into(),
            factory: Box::new(factory),
        }
    }

    /// Entry for a default-constructible command, placed by the module its
    /// type is defined in.
    pub fn of<T>() -> Self
    where
        T: Command + Default + 'static,
    {
        Self::new(module_of::<T>(), || Ok(Box::new(T::default())))
    }

    /// Entry for a command built by `factory`, placed by the module its type
    /// is defined in.
    pub fn from_fn<T, F>(factory: F) -> Self
    where
        T: Command + 'static,
        F: Fn() -> Result<T> + 'static,
    {
        Self::new(module_of::<T>(), move || {
            factory().map(|command| Box::new(command) as Box<dyn Command>)
        })
    }

    pub fn module(&self) -> &str {
        &self.module
    }
}

impl std::fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandEntry")
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

/// Module path of a (non-generic) type: its type path without the type name.
fn module_of<T: ?Sized>() -> String {
    let type_path = std::any::type_name::<T>();
    match type_path.rsplit_once("::") {
        Some((module, _)) => module.to_string(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The module is not below the command root.
    OutsideRoot,
    /// The command's dependency gate did not pass.
    MissingDependencies { group: String },
    /// The command returned blank values for required metadata.
    Incomplete { missing: Vec<&'static str> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedCommand {
    pub module: String,
    pub name: Option<String>,
    pub reason: SkipReason,
}

/// Outcome of one discovery pass.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub registered: Vec<String>,
    pub skipped: Vec<SkippedCommand>,
    pub failures: Vec<CommandManagerError>,
}

pub struct CommandManager {
    root: String,
    program: String,
    about: String,
    version: Option<String>,
    entries: Vec<CommandEntry>,
    availability: Arc<Availability>,
    hierarchy: Hierarchy,
    span: Span,
}

impl CommandManager {
    /// `root` is the module path prefix stripped before placing commands,
    /// e.g. `toolkit::cmd`.
    pub fn new(root: impl Into<String>, entries: Vec<CommandEntry>) -> Self {
        let root = root.into();
        let span = tracing::debug_span!("command_manager", root = %root);
        Self {
            root,
            program: "toolkit".to_string(),
            about: "toolkit CLI - A command-line toolkit".to_string(),
            version: None,
            entries,
            availability: Arc::new(Availability::compiled()),
            hierarchy: Hierarchy::new(),
            span,
        }
    }

    /// Accepts an owned `Availability` or one shared with the commands.
    pub fn with_availability(mut self, availability: impl Into<Arc<Availability>>) -> Self {
        self.availability = availability.into();
        self
    }

    pub fn with_program(mut self, name: impl Into<String>, about: impl Into<String>) -> Self {
        self.program = name.into();
        self.about = about.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// Build the hierarchy from the manifest.
    ///
    /// The previous hierarchy is discarded first, so repeated calls produce
    /// the same tree. Per-entry failures are logged and reported; only a
    /// naming conflict returns `Err`.
    pub fn load_commands(&mut self) -> Result<LoadReport, CommandManagerError> {
        let _enter = self.span.clone().entered();
        tracing::debug!("Starting to load commands from root: {}", self.root);

        self.hierarchy.clear();
        let mut report = LoadReport::default();

        for entry in &self.entries {
            let Some(relative) = relative_segments(&self.root, &entry.module) else {
                tracing::debug!("Skipping module outside command root: {}", entry.module);
                report.skipped.push(SkippedCommand {
                    module: entry.module.clone(),
                    name: None,
                    reason: SkipReason::OutsideRoot,
                });
                continue;
            };

            tracing::debug!("Importing module {}", entry.module);
            let command = match (entry.factory)() {
                Ok(command) => command,
                Err(source) => {
                    let err = CommandManagerError::ModuleImport {
                        module_path: entry.module.clone(),
                        source,
                    };
                    tracing::error!("{}", err.describe());
                    report.failures.push(err);
                    continue;
                }
            };

            if let Some(gate) = command.gate()
                && !gate.can_register(command.name(), &self.availability)
            {
                tracing::debug!(
                    "Skipping optional command {} due to missing dependencies",
                    command.name()
                );
                report.skipped.push(SkippedCommand {
                    module: entry.module.clone(),
                    name: Some(command.name().to_string()),
                    reason: SkipReason::MissingDependencies {
                        group: gate.group.to_string(),
                    },
                });
                continue;
            }

            let missing = missing_metadata(command.as_ref());
            if !missing.is_empty() {
                tracing::debug!(
                    "Command in {} is missing required metadata: {:?} and will be skipped.",
                    entry.module,
                    missing
                );
                report.skipped.push(SkippedCommand {
                    module: entry.module.clone(),
                    name: Some(command.name().to_string()).filter(|n| !n.trim().is_empty()),
                    reason: SkipReason::Incomplete { missing },
                });
                continue;
            }

            if let Err(reason) = validate_name(command.name()) {
                let err = CommandManagerError::CommandLoad {
                    module_name: entry.module.clone(),
                    reason,
                };
                tracing::error!("{}", err.describe());
                report.failures.push(err);
                continue;
            }

            // The file-level module only locates the command; its declared
            // name is the leaf key.
            let namespace = match relative.split_last() {
                Some((_, namespace)) => namespace.to_vec(),
                None => Vec::new(),
            };
            let descriptor = CommandDescriptor::new(entry.module.clone(), command);
            let mut path = namespace.clone();
            path.push(descriptor.name.clone());

            self.hierarchy.insert(&namespace, descriptor)?;
            tracing::debug!("Command {} added successfully.", path.join(" "));
            report.registered.push(path.join(" "));
        }

        tracing::debug!(
            registered = report.registered.len(),
            skipped = report.skipped.len(),
            failed = report.failures.len(),
            "Finished loading commands."
        );
        Ok(report)
    }

    /// Compile the hierarchy into a nested parser.
    pub fn build_parser(&self) -> Result<clap::Command, CommandManagerError> {
        let _enter = self.span.clone().entered();
        tracing::debug!("Building argument parser hierarchy");

        let mut parser = clap::Command::new(self.program.clone())
            .about(self.about.clone())
            .subcommand_required(true)
            .arg_required_else_help(true);
        if let Some(version) = &self.version {
            parser = parser.version(version.clone());
        }

        for (name, node) in self.hierarchy.iter() {
            tracing::debug!("Adding domain to parser: {}", name);
            parser = parser.subcommand(compile_node(name, node)?);
        }
        Ok(parser)
    }

    /// Invoke the command selected in `matches`.
    pub fn dispatch(&self, matches: &ArgMatches) -> Result<()> {
        let mut level = &self.hierarchy;
        let mut current = matches;
        let mut path: Vec<&str> = Vec::new();

        loop {
            let Some((name, sub_matches)) = current.subcommand() else {
                bail!("No command selected under '{}'", path.join(" "));
            };
            path.push(name);
            match level.get(name) {
                Some(Node::Namespace(child)) => {
                    level = child;
                    current = sub_matches;
                }
                Some(Node::Command(descriptor)) => {
                    tracing::debug!("Running command: {}", path.join(" "));
                    return descriptor.command.run(sub_matches);
                }
                None => bail!("Unknown command '{}'", path.join(" ")),
            }
        }
    }

    /// Parse `args` (including the program name) and dispatch.
    pub fn run_from<I, T>(&self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self.build_parser()?.try_get_matches_from(args)?;
        self.dispatch(&matches)
    }
}

/// Segments of `module` below `root`, or `None` when it is not under `root`.
fn relative_segments(root: &str, module: &str) -> Option<Vec<String>> {
    let rest = if root.is_empty() {
        module
    } else {
        module.strip_prefix(root)?.strip_prefix("::")?
    };
    let segments: Vec<String> = rest
        .split("::")
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect();
    if segments.is_empty() {
        None
    } else {
        Some(segments)
    }
}

fn missing_metadata(command: &dyn Command) -> Vec<&'static str> {
    [
        ("name", command.name()),
        ("description", command.description()),
        ("help", command.help()),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(field, _)| field)
    .collect()
}

/// Subcommand names clap generates on every parser with subcommands.
const RESERVED_NAMES: &[&str] = &["help"];

fn validate_name(name: &str) -> std::result::Result<(), String> {
    if RESERVED_NAMES.contains(&name) {
        return Err(format!("command name '{name}' is reserved"));
    }
    if name.starts_with('-') {
        return Err(format!("command name '{name}' must not start with '-'"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(format!("command name '{name}' must not contain whitespace"));
    }
    Ok(())
}

fn compile_node(name: &str, node: &Node) -> Result<clap::Command, CommandManagerError> {
    tracing::debug!("Creating parser for: {}", name);
    match node {
        Node::Namespace(children) => {
            let mut parser = clap::Command::new(name.to_string())
                .about(format!("{name} commands"))
                .subcommand_required(true)
                .arg_required_else_help(true);
            for (child_name, child) in children.iter() {
                parser = parser.subcommand(compile_node(child_name, child)?);
            }
            Ok(parser)
        }
        Node::Command(descriptor) => {
            tracing::debug!("Registering command: {}", descriptor.name);
            let parser = register_command(descriptor.command.as_ref());
            check_arguments(&parser).map_err(|problem| CommandManagerError::ParserBuild {
                message: format!("Failed to add subparser for {name}: {problem}"),
                substructure: format!("{name} ({})", descriptor.module),
            })?;
            Ok(parser)
        }
    }
}

/// clap only asserts argument uniqueness in debug builds at parse time;
/// catch it while compiling so a bad command never reaches the user.
///
/// The flags clap generates later (`-h/--help`, and `-V/--version` when the
/// command has a version) count as already taken.
fn check_arguments(parser: &clap::Command) -> std::result::Result<(), String> {
    let mut ids = HashSet::new();
    let mut longs = HashSet::new();
    let mut shorts = HashSet::new();

    if !parser.is_disable_help_flag_set() {
        ids.insert("help");
        longs.insert("help");
        shorts.insert('h');
    }
    if parser.get_version().is_some() && !parser.is_disable_version_flag_set() {
        ids.insert("version");
        longs.insert("version");
        shorts.insert('V');
    }

    for arg in parser.get_arguments() {
        let id = arg.get_id().as_str();
        if !ids.insert(id) {
            return Err(format!("duplicate argument id '{id}'"));
        }
        if let Some(long) = arg.get_long()
            && !longs.insert(long)
        {
            return Err(format!("duplicate flag '--{long}'"));
        }
        if let Some(short) = arg.get_short()
            && !shorts.insert(short)
        {
            return Err(format!("duplicate flag '-{short}'"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::dependencies::StaticProbe;
    use crate::command::optional::DependencyGate;
    use clap::Arg;

    #[derive(Default)]
    struct Report;

    impl Command for Report {
        fn name(&self) -> &str {
            "report"
        }

        fn description(&self) -> &str {
            "Generate a report"
        }

        fn help(&self) -> &str {
            "Generate a report for the given period."
        }

        fn arguments(&self, parser: clap::Command) -> clap::Command {
            parser.arg(Arg::new("period").long("period"))
        }

        fn run(&self, _args: &ArgMatches) -> Result<()> {
            Ok(())
        }
    }

    struct Custom {
        name: &'static str,
        help: &'static str,
        gate: Option<DependencyGate>,
        duplicate_flag: bool,
    }

    impl Custom {
        fn named(name: &'static str) -> Self {
            Self {
                name,
                help: "custom help",
                gate: None,
                duplicate_flag: false,
            }
        }
    }

    impl Command for Custom {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "custom"
        }

        fn help(&self) -> &str {
            self.help
        }

        fn arguments(&self, parser: clap::Command) -> clap::Command {
            if self.duplicate_flag {
                parser
                    .arg(Arg::new("first").long("output"))
                    .arg(Arg::new("second").long("output"))
            } else {
                parser
            }
        }

        fn run(&self, _args: &ArgMatches) -> Result<()> {
            Ok(())
        }

        fn gate(&self) -> Option<DependencyGate> {
            self.gate
        }
    }

    fn entry(module: &str, build: fn() -> Custom) -> CommandEntry {
        CommandEntry::new(module, move || Ok(Box::new(build()) as Box<dyn Command>))
    }

    #[test]
    fn module_of_strips_type_name() {
        assert_eq!(module_of::<Report>(), module_path!());
    }

    #[test]
    fn entry_of_uses_defining_module() {
        let entry = CommandEntry::of::<Report>();
        assert_eq!(entry.module(), module_path!());
    }

    #[test]
    fn relative_segments_requires_root_prefix() {
        assert_eq!(
            relative_segments("toolkit::cmd", "toolkit::cmd::jira::report_command"),
            Some(vec!["jira".to_string(), "report_command".to_string()])
        );
        assert_eq!(relative_segments("toolkit::cmd", "toolkit::command::x"), None);
        assert_eq!(relative_segments("toolkit::cmd", "toolkit::cmdx::y"), None);
        assert_eq!(relative_segments("toolkit::cmd", "toolkit::cmd"), None);
    }

    #[test]
    fn namespace_comes_from_module_and_leaf_from_name() {
        let mut manager = CommandManager::new(
            "app::cmd",
            vec![entry("app::cmd::jira::summary::report_command", || {
                Custom::named("weekly")
            })],
        );
        let report = manager.load_commands().unwrap();
        assert_eq!(report.registered, vec!["jira summary weekly"]);
        assert!(
            manager
                .hierarchy()
                .resolve(&["jira", "summary", "weekly"])
                .is_some()
        );
    }

    #[test]
    fn module_directly_under_root_is_top_level() {
        let mut manager = CommandManager::new(
            "app::cmd",
            vec![entry("app::cmd::version_command", || Custom::named("version"))],
        );
        manager.load_commands().unwrap();
        assert!(manager.hierarchy().resolve(&["version"]).is_some());
    }

    #[test]
    fn entries_outside_root_are_skipped() {
        let mut manager = CommandManager::new(
            "app::cmd",
            vec![entry("app::util::helper", || Custom::named("helper"))],
        );
        let report = manager.load_commands().unwrap();
        assert!(report.registered.is_empty());
        assert_eq!(report.skipped[0].reason, SkipReason::OutsideRoot);
    }

    #[test]
    fn failing_factory_is_recorded_not_raised() {
        let mut manager = CommandManager::new(
            "app::cmd",
            vec![
                CommandEntry::new("app::cmd::jira::broken", || {
                    anyhow::bail!("JIRA_URL is not set")
                }),
                entry("app::cmd::jira::ok", || Custom::named("ok")),
            ],
        );
        let report = manager.load_commands().unwrap();
        assert_eq!(report.registered, vec!["jira ok"]);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            report.failures[0],
            CommandManagerError::ModuleImport { .. }
        ));
    }

    #[test]
    fn invalid_name_is_command_load_failure() {
        let mut manager = CommandManager::new(
            "app::cmd",
            vec![entry("app::cmd::jira::bad", || Custom::named("two words"))],
        );
        let report = manager.load_commands().unwrap();
        assert!(report.registered.is_empty());
        assert!(matches!(
            report.failures[0],
            CommandManagerError::CommandLoad { .. }
        ));
    }

    #[test]
    fn blank_help_is_skipped_as_incomplete() {
        let mut manager = CommandManager::new(
            "app::cmd",
            vec![entry("app::cmd::jira::nohelp", || Custom {
                help: "",
                ..Custom::named("nohelp")
            })],
        );
        let report = manager.load_commands().unwrap();
        assert!(report.failures.is_empty());
        assert_eq!(
            report.skipped[0].reason,
            SkipReason::Incomplete {
                missing: vec!["help"]
            }
        );
    }

    #[test]
    fn gate_is_checked_before_metadata() {
        let mut manager = CommandManager::new(
            "app::cmd",
            vec![entry("app::cmd::ml::classify", || Custom {
                help: "",
                gate: Some(DependencyGate::new("ml", &["sklearn"])),
                ..Custom::named("classify")
            })],
        )
        .with_availability(Availability::new(StaticProbe::default()));
        let report = manager.load_commands().unwrap();
        assert_eq!(
            report.skipped[0].reason,
            SkipReason::MissingDependencies {
                group: "ml".to_string()
            }
        );
    }

    #[test]
    fn generated_flags_count_as_taken() {
        let short_h = clap::Command::new("ping").arg(Arg::new("host").short('h'));
        assert_eq!(check_arguments(&short_h), Err("duplicate flag '-h'".to_string()));

        let long_help = clap::Command::new("ping").arg(Arg::new("topic").long("help"));
        assert_eq!(check_arguments(&long_help), Err("duplicate flag '--help'".to_string()));

        let own_help = clap::Command::new("ping")
            .disable_help_flag(true)
            .arg(Arg::new("host").short('h'));
        assert!(check_arguments(&own_help).is_ok());
    }

    #[test]
    fn version_flag_is_taken_only_when_versioned() {
        let plain = clap::Command::new("ping").arg(Arg::new("verbose").short('V'));
        assert!(check_arguments(&plain).is_ok());

        let versioned = clap::Command::new("ping")
            .version("1.0")
            .arg(Arg::new("verbose").short('V'));
        assert_eq!(check_arguments(&versioned), Err("duplicate flag '-V'".to_string()));
    }

    #[test]
    fn help_is_a_reserved_name() {
        assert!(validate_name("help").is_err());
        assert!(validate_name("helper").is_ok());
    }

    #[test]
    fn duplicate_flags_fail_parser_build() {
        let mut manager = CommandManager::new(
            "app::cmd",
            vec![entry("app::cmd::jira::dup", || Custom {
                duplicate_flag: true,
                ..Custom::named("dup")
            })],
        );
        manager.load_commands().unwrap();
        let err = manager.build_parser().unwrap_err();
        match &err {
            CommandManagerError::ParserBuild { substructure, .. } => {
                assert!(substructure.contains("app::cmd::jira::dup"));
            }
            other => panic!("Expected ParserBuild, got {other:?}"),
        }
        assert!(err.is_fatal());
    }

    #[test]
    fn dispatch_reaches_leaf_through_namespaces() {
        let mut manager = CommandManager::new(
            "app::cmd",
            vec![CommandEntry::new("app::cmd::jira::summary::report", || {
                Ok(Box::new(Report) as Box<dyn Command>)
            })],
        );
        manager.load_commands().unwrap();
        manager
            .run_from(["toolkit", "jira", "summary", "report", "--period", "q1"])
            .unwrap();
    }

    #[test]
    fn namespace_without_command_is_usage_error() {
        let mut manager = CommandManager::new(
            "app::cmd",
            vec![CommandEntry::new("app::cmd::jira::report", || {
                Ok(Box::new(Report) as Box<dyn Command>)
            })],
        );
        manager.load_commands().unwrap();
        let err = manager.run_from(["toolkit", "jira"]).unwrap_err();
        assert!(err.downcast_ref::<clap::Error>().is_some());
    }

    #[test]
    fn program_metadata_is_applied() {
        let manager = CommandManager::new("app::cmd", Vec::new())
            .with_program("mytool", "My tool")
            .with_version("1.2.3");
        let parser = manager.build_parser().unwrap();
        assert_eq!(parser.get_name(), "mytool");
        assert_eq!(parser.get_version(), Some("1.2.3"));
    }
}
