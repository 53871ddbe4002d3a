//! Logging setup for gentool.
//!
//! Library code emits `tracing` events; the binary installs a
//! `tracing-subscriber` fmt layer writing to stderr, filtered by an
//! `EnvFilter`. The filter comes from `GENTOOL_LOG`, then `RUST_LOG`,
//! then the configured default level. Initialization happens at most once.
//!
//! ```no_run
//! use gentool::util::logging;
//!
//! logging::init_default();
//! tracing::info!("ready");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Primary filter variable.
pub const LOG_ENV: &str = "GENTOOL_LOG";

static INIT: Once = Once::new();

/// Configuration for logging initialization.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Level used when neither environment variable is set
    pub level: Level,

    /// Include the module target (e.g. `gentool::core::resolver`)
    pub include_target: bool,

    /// Include file and line number
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            include_target: false,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// `-v` on the command line.
    pub fn verbose() -> Self {
        Self {
            level: Level::DEBUG,
            include_target: true,
            include_location: false,
        }
    }
}

/// Parse a level name, case-insensitive. Unknown names give `None`.
pub fn parse_level(level_str: &str) -> Option<Level> {
    match level_str.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// The filter directive in effect: `GENTOOL_LOG`, else `RUST_LOG`, else the
/// configured level. An explicit verbose level wins over a quieter default.
pub fn filter_directive(config: &LoggingConfig) -> String {
    filter_directive_from(
        config,
        env::var(LOG_ENV).ok().as_deref(),
        env::var("RUST_LOG").ok().as_deref(),
    )
}

fn filter_directive_from(
    config: &LoggingConfig,
    gentool_log: Option<&str>,
    rust_log: Option<&str>,
) -> String {
    if config.level > Level::WARN {
        // Level ordering: more verbose levels compare greater.
        return config.level.to_string().to_lowercase();
    }
    fn non_blank(v: Option<&str>) -> Option<&str> {
        v.map(str::trim).filter(|s| !s.is_empty())
    }
    match non_blank(gentool_log).or_else(|| non_blank(rust_log)) {
        // A bare level name is normalised; `warning` would otherwise be read
        // as a target name by EnvFilter.
        Some(value) => match parse_level(value) {
            Some(level) => level.to_string().to_lowercase(),
            None => value.to_string(),
        },
        None => config.level.to_string().to_lowercase(),
    }
}

/// Install the global subscriber. Later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let directive = filter_directive(&config);
        let filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
            eprintln!("warning: invalid log filter '{}': {}", directive, e);
            EnvFilter::new(config.level.to_string().to_lowercase())
        });

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(config.include_target)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location),
            )
            .try_init();
    });
}

pub fn init_default() {
    init_logging(LoggingConfig::default());
}
