//! Logging for the Wicket core.
//!
//! Thin configuration layer over `tracing` and `tracing-subscriber`.
//! Defaults to JSON output on STDOUT; the `RUST_LOG` environment variable
//! overrides the configured level when present.
//!
//! # Examples
//!
//! ```no_run
//! use wicket_core::logging::*;
//!
//! let _ = LogConfig::new()
//!     .level(LogLevel::Debug)
//!     .format(LogFormat::Pretty)
//!     .init();
//!
//! info!("dispatcher ready");
//! ```

use std::io;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt};

// Re-export the tracing macros so core modules log through one path.
pub use tracing::{debug, error, info, trace, warn};

/// Log level for filtering messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to tracing Level
    pub fn to_tracing_level(&self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }

    /// Convert to string for EnvFilter
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Output format for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON format (default): structured, machine-readable
    Json,
    /// Pretty format: colored, formatted for development
    Pretty,
    /// Compact format: minimal output
    Compact,
}

/// Output destination for logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Include target (module path) in output
    pub targets: bool,
    /// Custom environment filter (overrides level if set)
    pub env_filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Json,
            output: LogOutput::Stdout,
            targets: true,
            env_filter: None,
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set log level
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set output format
    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set output destination
    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    /// Enable or disable target (module path)
    pub fn with_targets(mut self, enable: bool) -> Self {
        self.targets = enable;
        self
    }

    /// Set custom environment filter, e.g. "wicket_core=debug"
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Install the subscriber. Returns an error when a global subscriber
    /// is already set, which callers (tests in particular) may ignore.
    pub fn init(self) -> Result<(), crate::Error> {
        let env_filter = if let Some(filter_str) = &self.env_filter {
            EnvFilter::try_new(filter_str)
                .unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
        } else {
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
        };

        let builder = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_target(self.targets);

        let result = match (self.format, self.output) {
            (LogFormat::Json, LogOutput::Stdout) => {
                builder.json().with_writer(io::stdout).try_init()
            }
            (LogFormat::Json, LogOutput::Stderr) => {
                builder.json().with_writer(io::stderr).try_init()
            }
            (LogFormat::Pretty, LogOutput::Stdout) => {
                builder.pretty().with_writer(io::stdout).try_init()
            }
            (LogFormat::Pretty, LogOutput::Stderr) => {
                builder.pretty().with_writer(io::stderr).try_init()
            }
            (LogFormat::Compact, LogOutput::Stdout) => {
                builder.compact().with_writer(io::stdout).try_init()
            }
            (LogFormat::Compact, LogOutput::Stderr) => {
                builder.compact().with_writer(io::stderr).try_init()
            }
        };

        result.map_err(|e| crate::Error::Internal(format!("logger init failed: {}", e)))
    }
}
