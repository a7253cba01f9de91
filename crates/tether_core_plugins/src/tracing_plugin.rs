//! Tracing and observability plugin.
//!
//! Provides [`TracingPlugin`], which installs a `tracing` subscriber so the
//! registry's events (registrations, propagation, teardown) become visible.
//!
//! # Lifecycle
//!
//! - **`build()`** inserts the [`TracingConfig`] setting so other plugins can
//!   read or override it.
//! - **`ready()`** installs the subscriber from the final setting. Deferring
//!   installation lets configuration added by other plugins take effect.
//!
//! # Example
//!
//! ```
//! use tether_core_plugins::{TracingConfig, TracingFormat, TracingPlugin};
//! use tether_world::world::World;
//! use tracing::Level;
//!
//! let mut world = World::new();
//! world.add_plugins(
//!     TracingPlugin::default()
//!         .with_level(Level::DEBUG)
//!         .with_format(TracingFormat::Compact),
//! );
//! world.finish();
//!
//! let config = world.setting::<TracingConfig>().unwrap();
//! assert_eq!(config.level, Level::DEBUG);
//! ```

use tether_world::plugin::Plugin;
use tether_world::world::{Setting, World};
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
// TracingConfig Setting
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing configuration, stored as a world setting.
///
/// Read at `ready()` time, so plugins built after [`TracingPlugin`] can
/// still change it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// The configured log level.
    pub level: Level,
    /// The configured output format.
    pub format: TracingFormat,
    /// Target-specific filter (e.g. `"tether_registry=trace"`), overriding
    /// `level` when it parses.
    pub env_filter: Option<String>,
    /// Whether span enter/exit events are printed.
    pub span_events: bool,
}

impl Setting for TracingConfig {}

impl TracingConfig {
    fn filter(&self) -> EnvFilter {
        match &self.env_filter {
            Some(filter) => {
                EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
            }
            None => EnvFilter::new(self.level.as_str()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingPlugin
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing and logging plugin.
///
/// # Settings Provided
///
/// | Setting | Description |
/// |---------|-------------|
/// | [`TracingConfig`] | Level, format, and filter of the installed subscriber |
///
/// # Configuration Options
///
/// ```
/// use tether_core_plugins::{TracingFormat, TracingPlugin};
/// use tracing::Level;
///
/// // Development: watch every propagation step
/// let dev_plugin = TracingPlugin::default()
///     .with_format(TracingFormat::Pretty)
///     .with_env_filter("tether_registry=trace,tether_world=debug");
///
/// // Production: JSON output for log aggregation
/// let prod_plugin = TracingPlugin::default()
///     .with_level(Level::INFO)
///     .with_format(TracingFormat::Json);
/// ```
#[derive(Clone)]
pub struct TracingPlugin {
    level: Level,
    format: TracingFormat,
    env_filter: Option<String>,
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
    /// Format: `target=level,target=level,...`
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

    fn config(&self) -> TracingConfig {
        TracingConfig {
            level: self.level,
            format: self.format,
            env_filter: self.env_filter.clone(),
            span_events: self.span_events,
        }
    }
}

impl Plugin for TracingPlugin {
    fn build(&self, world: &mut World) {
        world.insert_setting(self.config());
    }

    fn ready(&self, world: &mut World) {
        let config = world
            .setting::<TracingConfig>()
            .cloned()
            .unwrap_or_else(|| self.config());

        let span_events = if config.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        // try_init() fails if a global subscriber already exists; keep it.
        match config.format {
            TracingFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(config.filter())
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
                    .with(config.filter())
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
                    .with(config.filter())
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_span_events(span_events),
                    )
                    .try_init()
                    .ok();
            }
        }

        tracing::info!(
            level = %config.level,
            format = ?config.format,
            "TracingPlugin initialized"
        );
    }

    fn cleanup(&self, _world: &mut World) {
        tracing::info!("TracingPlugin shutting down");
    }
}
