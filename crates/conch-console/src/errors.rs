//! Error types for console operations.

use std::io;

use thiserror::Error;

/// Errors surfaced by console lifecycle operations.
///
/// Dispatch-time problems (malformed lines, unknown commands, failing
/// handlers) are diagnostics, not errors: the dispatch loop recovers from
/// all of them locally and never returns them to the caller.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// The console was destroyed and cannot be restarted.
    #[error("console {name} has been destroyed and cannot be restarted")]
    Destroyed {
        /// Name of the destroyed console.
        name: String,
    },
    /// The operating system refused to spawn the worker thread.
    #[error("failed to spawn console worker: {source}")]
    Spawn {
        /// Underlying spawn failure.
        #[source]
        source: io::Error,
    },
    /// The worker thread panicked while being joined.
    #[error("console worker thread panicked")]
    WorkerPanicked,
}

/// Errors produced while validating a raw input line.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LineError {
    /// A flag candidate did not begin with the flag marker.
    ///
    /// One malformed candidate rejects the entire line, even when the
    /// command name is registered. A zero-length candidate (produced by a
    /// doubled or trailing space) fails the same way.
    #[error("flag token {token:?} does not start with the '-' marker")]
    MalformedFlag {
        /// The offending token, unmodified.
        token: String,
    },
}
