//! Availability of optional dependencies.
//!
//! Optional integrations are cargo features. A command names the modules it
//! needs; a [`DependencyProbe`] answers whether each one was compiled in and
//! [`Availability`] memoizes the answers so each module is probed once.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::errors::OptionalDependencyError;

/// Answers whether a named module is available in this build.
pub trait DependencyProbe {
    fn probe(&self, module: &str) -> bool;
}

impl<F> DependencyProbe for F
where
    F: Fn(&str) -> bool,
{
    fn probe(&self, module: &str) -> bool {
        self(module)
    }
}

/// Modules that are behind a cargo feature, with whether the feature is on.
const COMPILED_MODULES: &[(&str, bool)] = &[
    ("tracing_appender", cfg!(feature = "file-logging")),
    ("clap", true),
    ("serde_json", true),
    ("toml", true),
    ("tracing", true),
];

/// Probe backed by the features this binary was compiled with.
/// Unknown module names are unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompiledFeatures;

impl DependencyProbe for CompiledFeatures {
    fn probe(&self, module: &str) -> bool {
        COMPILED_MODULES
            .iter()
            .any(|(name, enabled)| *name == module && *enabled)
    }
}

/// Probe that reports exactly the given modules as available.
#[derive(Debug, Clone, Default)]
pub struct StaticProbe {
    available: HashSet<String>,
}

impl StaticProbe {
    pub fn new<I, S>(modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            available: modules.into_iter().map(Into::into).collect(),
        }
    }
}

impl DependencyProbe for StaticProbe {
    fn probe(&self, module: &str) -> bool {
        self.available.contains(module)
    }
}

/// Memoizing wrapper around a probe.
pub struct Availability {
    probe: Box<dyn DependencyProbe + Send + Sync>,
    cache: Mutex<HashMap<String, bool>>,
}

impl Availability {
    pub fn new(probe: impl DependencyProbe + Send + Sync + 'static) -> Self {
        Self {
            probe: Box::new(probe),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Availability of the features compiled into this binary.
    pub fn compiled() -> Self {
        Self::new(CompiledFeatures)
    }

    pub fn is_available(&self, module: &str) -> bool {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(&known) = cache.get(module) {
            return known;
        }
        let available = self.probe.probe(module);
        cache.insert(module.to_string(), available);
        available
    }

    pub fn all_available(&self, modules: &[&str]) -> bool {
        modules.iter().all(|module| self.is_available(module))
    }
}

impl Default for Availability {
    fn default() -> Self {
        Self::compiled()
    }
}

impl std::fmt::Debug for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        f.debug_struct("Availability").field("cache", &*cache).finish()
    }
}

/// Fail with an install hint when `module` from `group` is not available.
pub fn require_optional(
    availability: &Availability,
    module: &str,
    group: &str,
) -> Result<(), OptionalDependencyError> {
    if availability.is_available(module) {
        Ok(())
    } else {
        Err(OptionalDependencyError {
            name: module.to_string(),
            group: group.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn compiled_features_knows_core_modules() {
        assert!(CompiledFeatures.probe("clap"));
        assert!(CompiledFeatures.probe("serde_json"));
        assert_eq!(
            CompiledFeatures.probe("tracing_appender"),
            cfg!(feature = "file-logging")
        );
    }

    #[test]
    fn unknown_module_is_unavailable() {
        assert!(!CompiledFeatures.probe("definitely_not_a_module"));
    }

    #[test]
    fn availability_memoizes_probe_results() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let availability = Availability::new(move |module: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            module == "sklearn"
        });

        assert!(availability.is_available("sklearn"));
        assert!(availability.is_available("sklearn"));
        assert!(!availability.is_available("scipy"));
        assert!(!availability.is_available("scipy"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn all_available_requires_every_module() {
        let availability = Availability::new(StaticProbe::new(["a", "b"]));
        assert!(availability.all_available(&["a", "b"]));
        assert!(!availability.all_available(&["a", "c"]));
        assert!(availability.all_available(&[]));
    }

    #[test]
    fn require_optional_reports_group() {
        let availability = Availability::new(StaticProbe::default());
        let err = require_optional(&availability, "google_genai", "llm").unwrap_err();
        assert_eq!(err.name, "google_genai");
        assert_eq!(err.group, "llm");

        let availability = Availability::new(StaticProbe::new(["google_genai"]));
        assert!(require_optional(&availability, "google_genai", "llm").is_ok());
    }
}
