//! Configuration types for the conch console.
//!
//! A console instance is configured entirely at construction time through
//! [`ConsoleSettings`]: the name used in diagnostics, an optional pacing
//! interval for the dispatch loop, and the logging filter and format used by
//! the telemetry initialiser. Defaults live in [`defaults`] and every field
//! can be overridden from the environment via [`ConsoleSettings::from_env`].

pub mod defaults;
mod logging;

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use defaults::{DEFAULT_CONSOLE_NAME, DEFAULT_LOG_FILTER, DEFAULT_POLL_INTERVAL};
pub use logging::{LogFormat, LogFormatParseError};

/// Environment variable overriding the console name.
pub const ENV_CONSOLE_NAME: &str = "CONCH_CONSOLE_NAME";

/// Environment variable enabling pacing, in milliseconds.
pub const ENV_POLL_INTERVAL_MS: &str = "CONCH_POLL_INTERVAL_MS";

/// Environment variable overriding the log filter expression.
pub const ENV_LOG_FILTER: &str = "CONCH_LOG_FILTER";

/// Environment variable overriding the log format.
pub const ENV_LOG_FORMAT: &str = "CONCH_LOG_FORMAT";

/// Construction-time settings for a console instance.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConsoleSettings {
    name: String,
    poll_interval_ms: Option<u64>,
    log_filter: String,
    log_format: LogFormat,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            name: defaults::default_console_name(),
            poll_interval_ms: None,
            log_filter: defaults::default_log_filter(),
            log_format: defaults::default_log_format(),
        }
    }
}

impl ConsoleSettings {
    /// Builds settings for a named console with everything else defaulted.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builds settings from the defaults with `CONCH_*` environment
    /// overrides applied. Unparseable values fall back to the default.
    #[must_use]
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Ok(name) = env::var(ENV_CONSOLE_NAME)
            && !name.is_empty()
        {
            settings.name = name;
        }
        if let Ok(value) = env::var(ENV_POLL_INTERVAL_MS)
            && let Ok(millis) = value.parse::<u64>()
        {
            settings.poll_interval_ms = Some(millis);
        }
        if let Ok(filter) = env::var(ENV_LOG_FILTER)
            && !filter.is_empty()
        {
            settings.log_filter = filter;
        }
        if let Ok(value) = env::var(ENV_LOG_FORMAT)
            && let Ok(format) = value.parse::<LogFormat>()
        {
            settings.log_format = format;
        }
        settings
    }

    /// Sets the pacing interval applied before each blocking read.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = Some(u64::try_from(interval.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Sets the log filter expression.
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Sets the log format.
    #[must_use]
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Name identifying the console in diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pacing interval for the dispatch loop, when enabled.
    #[must_use]
    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval_ms.map(Duration::from_millis)
    }

    /// Log filter expression for the telemetry initialiser.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log format for the telemetry initialiser.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    // Environment mutation must not interleave across tests.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_match_constants() {
        let settings = ConsoleSettings::default();
        assert_eq!(settings.name(), DEFAULT_CONSOLE_NAME);
        assert_eq!(settings.poll_interval(), None);
        assert_eq!(settings.log_filter(), DEFAULT_LOG_FILTER);
        assert_eq!(settings.log_format(), LogFormat::Compact);
    }

    #[test]
    fn new_sets_only_the_name() {
        let settings = ConsoleSettings::new("demo");
        assert_eq!(settings.name(), "demo");
        assert_eq!(settings.poll_interval(), None);
    }

    #[test]
    fn builders_apply_overrides() {
        let settings = ConsoleSettings::new("demo")
            .with_poll_interval(Duration::from_millis(250))
            .with_log_filter("debug")
            .with_log_format(LogFormat::Json);
        assert_eq!(settings.poll_interval(), Some(Duration::from_millis(250)));
        assert_eq!(settings.log_filter(), "debug");
        assert_eq!(settings.log_format(), LogFormat::Json);
    }

    #[test]
    fn from_env_applies_overrides() {
        let _guard = ENV_LOCK.lock().expect("env lock");
        // SAFETY: guarded by ENV_LOCK; no other thread reads these variables.
        unsafe {
            std::env::set_var(ENV_CONSOLE_NAME, "env-console");
            std::env::set_var(ENV_POLL_INTERVAL_MS, "750");
            std::env::set_var(ENV_LOG_FILTER, "conch_console=debug");
            std::env::set_var(ENV_LOG_FORMAT, "json");
        }
        let settings = ConsoleSettings::from_env();
        // SAFETY: guarded by ENV_LOCK; no other thread reads these variables.
        unsafe {
            std::env::remove_var(ENV_CONSOLE_NAME);
            std::env::remove_var(ENV_POLL_INTERVAL_MS);
            std::env::remove_var(ENV_LOG_FILTER);
            std::env::remove_var(ENV_LOG_FORMAT);
        }
        assert_eq!(settings.name(), "env-console");
        assert_eq!(settings.poll_interval(), Some(Duration::from_millis(750)));
        assert_eq!(settings.log_filter(), "conch_console=debug");
        assert_eq!(settings.log_format(), LogFormat::Json);
    }

    #[test]
    fn from_env_ignores_invalid_values() {
        let _guard = ENV_LOCK.lock().expect("env lock");
        // SAFETY: guarded by ENV_LOCK; no other thread reads these variables.
        unsafe {
            std::env::set_var(ENV_POLL_INTERVAL_MS, "soon");
            std::env::set_var(ENV_LOG_FORMAT, "xml");
        }
        let settings = ConsoleSettings::from_env();
        // SAFETY: guarded by ENV_LOCK; no other thread reads these variables.
        unsafe {
            std::env::remove_var(ENV_POLL_INTERVAL_MS);
            std::env::remove_var(ENV_LOG_FORMAT);
        }
        assert_eq!(settings.poll_interval(), None);
        assert_eq!(settings.log_format(), LogFormat::Compact);
    }
}
