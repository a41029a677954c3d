//! Structured telemetry initialisation for console hosts.
//!
//! Libraries only emit `tracing` events; installing a subscriber is the
//! host's call. Hosts without their own telemetry stack can use
//! [`initialise`], which builds a formatting subscriber from the
//! console's settings and installs it globally exactly once.

use std::io::{self, IsTerminal};

use conch_config::{ConsoleSettings, LogFormat};
use once_cell::sync::OnceCell;
use tracing::Subscriber;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Handle returned once telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured log filter expression failed to parse.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Installing the global subscriber was rejected, typically because
    /// the host already installed one.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global tracing subscriber on first use.
///
/// Repeated calls are idempotent: only the first invocation touches the
/// global state; later calls return a fresh [`TelemetryHandle`] without
/// reconfiguring anything.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter expression is invalid or
/// the subscriber cannot be installed.
pub fn initialise(settings: &ConsoleSettings) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(settings))
        .map(|_guard| TelemetryHandle)
}

fn install_subscriber(settings: &ConsoleSettings) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(settings.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        // Colour only on interactive terminals; log sinks get plain text.
        .with_ansi(io::stderr().is_terminal())
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match settings.log_format() {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use conch_config::ConsoleSettings;

    use super::initialise;

    #[test]
    fn initialise_is_idempotent() {
        let settings = ConsoleSettings::default();
        let first = initialise(&settings);
        let second = initialise(&settings);
        assert!(first.is_ok());
        assert!(second.is_ok());
    }
}
