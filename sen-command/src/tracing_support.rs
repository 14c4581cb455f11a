//! Tracing and logging support.
//!
//! The dispatcher always emits `tracing` events: one `dispatch` span per
//! tree level, `debug` events for each routing decision, `info` when
//! subcommands are attached or removed, and `warn` when a route is
//! overwritten. This module installs a subscriber for applications that do
//! not bring their own.
//!
//! # Environment Variables
//!
//! - `RUST_LOG=sen_command=debug` - Show routing decisions
//! - `SEN_LOG_FORMAT=json` - Select the output format (`pretty`, `compact`, `json`)

pub use tracing::{self, debug, error, info, instrument, trace, warn};

#[cfg(feature = "tracing")]
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Environment variable read by [`TracingConfig::from_env`].
pub const LOG_FORMAT_ENV: &str = "SEN_LOG_FORMAT";

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TracingFormat {
    /// Human-readable, multi-line.
    #[default]
    Pretty,

    /// One line per event.
    Compact,

    /// JSON, one object per event.
    Json,
}

impl std::str::FromStr for TracingFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(TracingFormat::Pretty),
            "compact" => Ok(TracingFormat::Compact),
            "json" => Ok(TracingFormat::Json),
            other => Err(format!(
                "unknown log format '{other}' (expected pretty, compact or json)"
            )),
        }
    }
}

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Log level filter.
    ///
    /// If None, uses RUST_LOG or defaults to "info".
    pub level: Option<tracing::Level>,

    pub format: TracingFormat,

    pub timestamps: bool,

    /// Include target module names in output.
    pub target: bool,

    pub thread_ids: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: None,
            format: TracingFormat::Pretty,
            timestamps: true,
            target: true,
            thread_ids: false,
        }
    }
}

impl TracingConfig {
    /// Defaults, with the format taken from `SEN_LOG_FORMAT` when it is set
    /// to a known value.
    pub fn from_env() -> Self {
        let format = std::env::var(LOG_FORMAT_ENV)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or_default();
        Self {
            format,
            ..Self::default()
        }
    }
}

/// Initialize a subscriber with [`TracingConfig::from_env`].
///
/// Returns `false` if a global subscriber was already installed.
///
/// # Example
///
/// ```ignore
/// fn main() {
///     sen_command::init_subscriber();
///
///     // Build and run the command tree
/// }
/// ```
#[cfg(feature = "tracing")]
pub fn init_subscriber() -> bool {
    init_subscriber_with_config(TracingConfig::from_env())
}

/// Initialize a subscriber with custom configuration.
///
/// Returns `false` if a global subscriber was already installed.
///
/// # Example
///
/// ```ignore
/// use sen_command::{init_subscriber_with_config, TracingConfig, TracingFormat};
///
/// init_subscriber_with_config(TracingConfig {
///     format: TracingFormat::Json,
///     timestamps: false,
///     ..Default::default()
/// });
/// ```
#[cfg(feature = "tracing")]
pub fn init_subscriber_with_config(config: TracingConfig) -> bool {
    let filter = match config.level {
        Some(level) => EnvFilter::new(level.to_string()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let layer = tracing_subscriber::fmt::layer()
        .with_target(config.target)
        .with_thread_ids(config.thread_ids);

    let layer = match (config.format, config.timestamps) {
        (TracingFormat::Pretty, true) => layer.pretty().boxed(),
        (TracingFormat::Pretty, false) => layer.pretty().without_time().boxed(),
        (TracingFormat::Compact, true) => layer.compact().boxed(),
        (TracingFormat::Compact, false) => layer.compact().without_time().boxed(),
        (TracingFormat::Json, true) => layer.json().boxed(),
        (TracingFormat::Json, false) => layer.json().without_time().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .is_ok()
}

// Fallback when tracing feature is disabled
#[cfg(not(feature = "tracing"))]
pub fn init_subscriber() -> bool {
    false
}

#[cfg(not(feature = "tracing"))]
pub fn init_subscriber_with_config(_config: TracingConfig) -> bool {
    false
}
