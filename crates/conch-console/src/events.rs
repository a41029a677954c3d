//! Lifecycle events and the observer seam.
//!
//! A console optionally carries one observer, supplied at construction.
//! The console emits events to it but never depends on its presence or on
//! anything it does; observers must not block for long, since dispatch
//! events are delivered on the worker thread.

use std::sync::Arc;

/// Tracing target for the bundled observer.
pub(crate) const EVENT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::events");

/// Lifecycle events emitted by a console instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEvent {
    /// The console started accepting input.
    Started,
    /// Stop was requested; the worker exits at its next shutdown check.
    Stopped,
    /// The input source reached end-of-stream; the worker has exited.
    SourceClosed,
    /// A blocking read failed. The loop backs off and keeps running, so
    /// this event may repeat.
    ReadInterrupted {
        /// Description of the read failure.
        detail: String,
    },
}

/// Observer notified of console lifecycle events.
pub trait ConsoleObserver: Send + Sync {
    /// Invoked once per event, on whichever thread the event arises.
    fn on_event(&self, console: &str, event: &ConsoleEvent);
}

impl<T> ConsoleObserver for Arc<T>
where
    T: ConsoleObserver,
{
    fn on_event(&self, console: &str, event: &ConsoleEvent) {
        (**self).on_event(console, event);
    }
}

/// Bundled observer that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredObserver;

impl StructuredObserver {
    /// Builds a new observer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ConsoleObserver for StructuredObserver {
    fn on_event(&self, console: &str, event: &ConsoleEvent) {
        match event {
            ConsoleEvent::Started => {
                tracing::info!(target: EVENT_TARGET, console, event = "started", "console started");
            }
            ConsoleEvent::Stopped => {
                tracing::info!(target: EVENT_TARGET, console, event = "stopped", "console stopped");
            }
            ConsoleEvent::SourceClosed => {
                tracing::info!(
                    target: EVENT_TARGET,
                    console,
                    event = "source_closed",
                    "console input source closed"
                );
            }
            ConsoleEvent::ReadInterrupted { detail } => {
                tracing::warn!(
                    target: EVENT_TARGET,
                    console,
                    event = "read_interrupted",
                    detail = %detail,
                    "console read interrupted"
                );
            }
        }
    }
}
