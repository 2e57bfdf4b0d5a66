//! Tracing subscriber setup for the Veil workspace
//!
//! Library crates only emit `tracing` events. Hosts and test suites install
//! a subscriber through [`VeilSubscriberBuilder`].
//!
//! ```ignore
//! use veil_logging::{LogConfig, VeilSubscriberBuilder};
//!
//! // JSONL to console
//! VeilSubscriberBuilder::new().init();
//!
//! // Human-readable output during development
//! VeilSubscriberBuilder::new()
//!     .with_config(LogConfig::development())
//!     .init();
//! ```

pub mod config;

pub use config::{ConsoleConfig, LogConfig};

use thiserror::Error;
use tracing::debug;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Errors raised while installing a subscriber
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid filter directives: {0}")]
    InvalidFilter(String),

    #[error("Subscriber already installed: {0}")]
    AlreadyInstalled(String),
}

/// Builder for configuring and initializing the Veil logging subscriber
pub struct VeilSubscriberBuilder {
    config: LogConfig,
}

impl VeilSubscriberBuilder {
    /// Create a new subscriber builder with default configuration
    pub fn new() -> Self {
        Self {
            config: LogConfig::default(),
        }
    }

    /// Use a specific configuration
    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the default log level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.default_level = level.into();
        self
    }

    /// Enable or disable console output
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.config.console.enabled = enabled;
        self
    }

    /// Override the level for one target
    pub fn with_target(mut self, target: impl Into<String>, level: impl Into<String>) -> Self {
        self.config.targets.insert(target.into(), level.into());
        self
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    fn env_filter(&self) -> Result<EnvFilter, LoggingError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(self.config.directives())
                .map_err(|e| LoggingError::InvalidFilter(e.to_string())),
        }
    }

    /// Install the subscriber globally
    ///
    /// Fails if the filter directives are invalid or a global subscriber has
    /// already been set (common when several tests share a process).
    pub fn try_init(self) -> Result<(), LoggingError> {
        let registry = Registry::default().with(self.env_filter()?);
        let console = self.config.console.clone();
        let directives = self.config.directives();

        let result = match (console.enabled, console.pretty) {
            (false, _) => registry.try_init(),
            (true, true) => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_ansi(console.ansi)
                        .with_target(true),
                )
                .try_init(),
            (true, false) => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .flatten_event(true)
                        .with_ansi(false)
                        .with_target(true),
                )
                .try_init(),
        };

        result.map_err(|e| LoggingError::AlreadyInstalled(e.to_string()))?;

        debug!(
            directives = %directives,
            pretty = console.pretty,
            console = console.enabled,
            "Logging initialized"
        );
        Ok(())
    }

    /// Install the subscriber globally
    ///
    /// # Panics
    ///
    /// Panics if a global subscriber has already been set.
    pub fn init(self) {
        if let Err(e) = self.try_init() {
            panic!("Failed to initialize logging: {}", e);
        }
    }
}

impl Default for VeilSubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides() {
        let builder = VeilSubscriberBuilder::new()
            .with_level("debug")
            .with_console(false)
            .with_target("veil_core", "trace");

        assert_eq!(builder.config().default_level, "debug");
        assert!(!builder.config().console.enabled);
        assert_eq!(
            builder.config().targets.get("veil_core").map(String::as_str),
            Some("trace")
        );
    }

    #[test]
    fn test_error_display() {
        let err = LoggingError::InvalidFilter("bad".to_string());
        assert!(format!("{}", err).contains("Invalid filter"));
        assert!(format!("{}", err).contains("bad"));
    }
}
