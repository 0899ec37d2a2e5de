//! Tracing subscriber setup.
//!
//! Console output goes to stderr with colours; file output rotates hourly
//! under `logging.dir` and keeps `retention_hours` files. `RUST_LOG`, when
//! set, replaces the configured level.

use anyhow::{Context, Result};
use tracing_subscriber::filter::{EnvFilter, FilterExt, filter_fn};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::{Filter, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry, fmt};

use crate::command::dependencies::{Availability, require_optional};
use crate::config::LoggingSection;
use crate::errors::WithMetadata;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;
type BoxedFilter = Box<dyn Filter<Registry> + Send + Sync>;

/// Keeps the background file writer alive; drop it last.
#[must_use]
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file: Option<tracing_appender::non_blocking::WorkerGuard>,
}

/// Install the global subscriber described by `settings`.
pub fn init(settings: &LoggingSection, availability: &Availability) -> Result<LoggingGuard> {
    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut deferred_warning = None;

    let file_requested = settings.output.to_file();
    let file_enabled = match require_optional(availability, "tracing_appender", "file-logging") {
        Ok(()) => file_requested,
        Err(err) => {
            if file_requested {
                deferred_warning = Some(err.describe());
            }
            false
        }
    };

    if settings.output.to_console() || (file_requested && !file_enabled) {
        layers.push(console_layer(settings));
    }

    #[cfg(feature = "file-logging")]
    let file_guard = if file_enabled {
        let (layer, guard) = file_layer(settings)?;
        layers.push(layer);
        Some(guard)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if let Some(warning) = deferred_warning {
        tracing::warn!("{}", warning);
    }

    Ok(LoggingGuard {
        #[cfg(feature = "file-logging")]
        _file: file_guard,
    })
}

fn timer() -> ChronoLocal {
    ChronoLocal::new(TIME_FORMAT.to_string())
}

fn layer_filter(settings: &LoggingSection) -> BoxedFilter {
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.directive()));
    if settings.use_filter {
        let exact = settings.level.as_tracing();
        Box::new(env.and(filter_fn(move |metadata| *metadata.level() == exact)))
    } else {
        Box::new(env)
    }
}

fn console_layer(settings: &LoggingSection) -> BoxedLayer {
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(timer())
        .with_target(true)
        .with_filter(layer_filter(settings))
        .boxed()
}

#[cfg(feature = "file-logging")]
fn file_layer(
    settings: &LoggingSection,
) -> Result<(BoxedLayer, tracing_appender::non_blocking::WorkerGuard)> {
    use tracing_appender::rolling::{Builder, Rotation};

    std::fs::create_dir_all(&settings.dir).with_context(|| {
        format!(
            "Failed to create log directory: {}",
            settings.dir.display()
        )
    })?;

    let mut builder = Builder::new()
        .rotation(Rotation::HOURLY)
        .filename_prefix(settings.file.clone());
    if settings.retention_hours > 0 {
        builder = builder.max_log_files(settings.retention_hours as usize);
    }
    let appender = builder
        .build(&settings.dir)
        .context("Failed to create rolling log file")?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let base = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_timer(timer());
    let layer = if settings.json {
        base.json().with_filter(layer_filter(settings)).boxed()
    } else {
        base.with_filter(layer_filter(settings)).boxed()
    };
    Ok((layer, guard))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use std::sync::{Arc, Mutex};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::Context;

    struct Capture(Arc<Mutex<Vec<Level>>>);

    impl<S: Subscriber> Layer<S> for Capture {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            self.0.lock().unwrap().push(*event.metadata().level());
        }
    }

    fn captured(settings: &LoggingSection) -> Vec<Level> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry()
            .with(Capture(Arc::clone(&seen)).with_filter(layer_filter(settings)));
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("debug");
            tracing::info!("info");
            tracing::warn!("warn");
            tracing::error!("error");
        });
        let levels = seen.lock().unwrap().clone();
        levels
    }

    fn settings(level: LogLevel, use_filter: bool) -> LoggingSection {
        LoggingSection {
            level,
            use_filter,
            ..LoggingSection::default()
        }
    }

    #[test]
    fn level_filter_keeps_level_and_above() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let levels = captured(&settings(LogLevel::Warning, false));
        assert_eq!(levels, vec![Level::WARN, Level::ERROR]);
    }

    #[test]
    fn exact_filter_keeps_only_level() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let levels = captured(&settings(LogLevel::Info, true));
        assert_eq!(levels, vec![Level::INFO]);
    }

    #[test]
    fn critical_behaves_as_error() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let levels = captured(&settings(LogLevel::Critical, false));
        assert_eq!(levels, vec![Level::ERROR]);
    }
}
