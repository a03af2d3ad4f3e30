//! Tracing and observability plugin.
//!
//! Provides [`TracingPlugin`], which installs a `tracing` subscriber when
//! applied to a registry. The registry emits `debug!` events for node and
//! rule registration, state steps and rule firing, and `trace!` events for
//! rule scheduling; filter them with [`TracingPlugin::with_env_filter`]:
//!
//! ```
//! use arbor_plugins::TracingPlugin;
//! use arbor_registry::registry::ModelRegistry;
//!
//! let mut registry = ModelRegistry::new();
//! registry
//!     .apply_plugin(TracingPlugin::new().with_env_filter("arbor_registry=debug"))
//!     .unwrap();
//! ```

use arbor_model::Result;
use arbor_registry::plugin::Plugin;
use arbor_registry::registry::ModelRegistry;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable colored output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingConfig
// ─────────────────────────────────────────────────────────────────────────────

/// The settings a [`TracingPlugin`] installs its subscriber with.
///
/// Build scripts can read it to decide how much to log themselves:
///
/// ```
/// use arbor_plugins::TracingPlugin;
/// use tracing::Level;
///
/// let config = TracingPlugin::new().with_level(Level::DEBUG).config();
/// if config.level <= Level::DEBUG {
///     tracing::debug!(format = ?config.format, "verbose model logging");
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracingConfig {
    /// The configured log level.
    pub level: Level,
    /// The configured output format.
    pub format: TracingFormat,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingPlugin
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing and logging plugin.
///
/// Installs a `tracing-subscriber` registry with an [`EnvFilter`] and a
/// formatting layer. If a global subscriber is already installed, applying
/// the plugin leaves it in place.
///
/// # Configuration Options
///
/// ```
/// use arbor_plugins::{TracingPlugin, TracingFormat};
/// use tracing::Level;
///
/// // Development: pretty output, debug level, span enter/exit
/// let dev_plugin = TracingPlugin::default()
///     .with_level(Level::DEBUG)
///     .with_format(TracingFormat::Pretty)
///     .with_span_events(true);
///
/// // CI: JSON output, only engine warnings
/// let ci_plugin = TracingPlugin::default()
///     .with_format(TracingFormat::Json)
///     .with_env_filter("arbor_registry=warn");
/// ```
#[derive(Debug, Clone)]
pub struct TracingPlugin {
    /// Maximum log level.
    level: Level,
    /// Output format.
    format: TracingFormat,
    /// Environment filter (e.g., "`arbor_registry=debug`").
    env_filter: Option<String>,
    /// Whether to include span events (enter/exit).
    span_events: bool,
}

impl Default for TracingPlugin {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingPlugin {
    /// Creates a new `TracingPlugin` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets a custom environment filter string.
    ///
    /// Format: `target=level,target=level,...`. An unparsable filter falls
    /// back to the configured level.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Returns the configuration the subscriber is installed with.
    #[must_use]
    pub fn config(&self) -> TracingConfig {
        TracingConfig {
            level: self.level,
            format: self.format,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        match &self.env_filter {
            Some(filter) => {
                EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
            }
            None => EnvFilter::new(self.level.as_str()),
        }
    }

    fn install(&self) {
        let env_filter = self.env_filter();
        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        // try_init fails only if a global subscriber already exists
        match self.format {
            TracingFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .pretty()
                            .with_span_events(span_events),
                    )
                    .try_init()
                    .ok();
            }
            TracingFormat::Compact => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_span_events(span_events),
                    )
                    .try_init()
                    .ok();
            }
            TracingFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_span_events(span_events),
                    )
                    .try_init()
                    .ok();
            }
        }
    }
}

impl Plugin for TracingPlugin {
    fn apply(&self, registry: &mut ModelRegistry) -> Result<()> {
        self.install();
        tracing::info!(
            level = %self.level,
            format = ?self.format,
            nodes = registry.len(),
            rules = registry.rule_count(),
            "TracingPlugin initialized"
        );
        Ok(())
    }
}
