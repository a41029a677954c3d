//! Log output format selection.
//!
//! A console's diagnostics go to whoever is driving it, so the default
//! favours a person at a terminal; hosts shipping logs elsewhere opt
//! into JSON via settings or the `CONCH_LOG_FORMAT` variable.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How the telemetry initialiser renders events.
///
/// Parses case-insensitively from `compact` or `json`, the same names
/// accepted in settings files and the environment.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One event per line, for a person watching the console run.
    #[default]
    Compact,
    /// Newline-delimited JSON for machine consumption.
    Json,
}

/// Error produced when a format name matches no variant.
pub type LogFormatParseError = strum::ParseError;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::LogFormat;

    #[rstest]
    #[case("compact", LogFormat::Compact)]
    #[case("COMPACT", LogFormat::Compact)]
    #[case("json", LogFormat::Json)]
    #[case("Json", LogFormat::Json)]
    fn parses_case_insensitively(#[case] input: &str, #[case] expected: LogFormat) {
        let parsed: LogFormat = input.parse().expect("format should parse");
        assert_eq!(parsed, expected);
    }

    #[test]
    fn rejects_unknown_format() {
        let result: Result<LogFormat, _> = "xml".parse();
        assert!(result.is_err());
    }

    #[test]
    fn displays_snake_case() {
        assert_eq!(LogFormat::Compact.to_string(), "compact");
        assert_eq!(LogFormat::Json.to_string(), "json");
    }
}
