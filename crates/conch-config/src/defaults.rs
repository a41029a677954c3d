//! Default values shared by console hosts.

use std::time::Duration;

use crate::logging::LogFormat;

/// Default console name used in diagnostics when the host supplies none.
pub const DEFAULT_CONSOLE_NAME: &str = "conch";

/// Default log filter expression applied when none is configured.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Conventional pacing interval for hosts that enable pacing without
/// choosing a duration. Pacing is off by default.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Default console name as an owned string, for serde defaults.
#[must_use]
pub fn default_console_name() -> String {
    DEFAULT_CONSOLE_NAME.to_owned()
}

/// Default log filter as an owned string, for serde defaults.
#[must_use]
pub fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for console hosts.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Compact
}
