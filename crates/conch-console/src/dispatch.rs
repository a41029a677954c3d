//! The dispatch loop: reads lines, validates them, and invokes handlers.
//!
//! One worker thread runs [`run_dispatch_loop`] per console instance.
//! Handlers execute synchronously on that thread, so a slow handler
//! delays every subsequent read; that is the contract, not an accident.
//! Every per-line problem (malformed flags, unknown command, failing or
//! panicking handler) is reported as a warning and the loop carries on.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::events::{ConsoleEvent, ConsoleObserver};
use crate::line::parse_line;
use crate::registry::CommandRegistry;
use crate::source::{LinePoll, LineSource};

/// Tracing target for dispatch diagnostics.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Bound on each wait for input, so the shutdown flag is re-checked
/// promptly on sources that can honour it.
const READ_WAIT: Duration = Duration::from_millis(50);

/// Pause after a failed read before retrying.
const READ_ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// Everything the worker thread needs to run one dispatch loop.
pub(crate) struct DispatchContext {
    pub(crate) name: String,
    pub(crate) registry: Arc<CommandRegistry>,
    pub(crate) observer: Option<Arc<dyn ConsoleObserver>>,
    pub(crate) pacing: Arc<Mutex<Option<Duration>>>,
}

impl DispatchContext {
    fn pacing(&self) -> Option<Duration> {
        *self.pacing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn notify(&self, event: &ConsoleEvent) {
        if let Some(observer) = &self.observer {
            observer.on_event(&self.name, event);
        }
    }
}

/// Outcome of dispatching a single raw line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineOutcome {
    /// A handler ran to completion.
    Dispatched,
    /// The line was empty and ignored without a diagnostic.
    Skipped,
    /// A flag candidate lacked the marker; the whole line was rejected.
    Malformed,
    /// Valid syntax, but no registration matched the command name.
    Unknown,
    /// The handler returned an error or panicked, caught at the loop
    /// boundary.
    HandlerFailed,
}

/// Runs the dispatch loop until `shutdown` is raised or the source
/// closes. The flag is checked before and after each wait so a pending
/// stop never dispatches another line.
pub(crate) fn run_dispatch_loop(
    source: &mut dyn LineSource,
    shutdown: &AtomicBool,
    context: &DispatchContext,
) {
    info!(
        target: DISPATCH_TARGET,
        console = %context.name,
        "console awaiting input"
    );
    while !shutdown.load(Ordering::SeqCst) {
        if let Some(pause) = context.pacing() {
            thread::sleep(pause);
            if shutdown.load(Ordering::SeqCst) {
                break;
            }
        }
        match source.poll_line(READ_WAIT) {
            Ok(LinePoll::TimedOut) => {}
            Ok(LinePoll::Closed) => {
                info!(
                    target: DISPATCH_TARGET,
                    console = %context.name,
                    "console input source closed"
                );
                context.notify(&ConsoleEvent::SourceClosed);
                break;
            }
            Ok(LinePoll::Line(line)) => {
                if shutdown.load(Ordering::SeqCst) {
                    break;
                }
                dispatch_line(&line, context);
            }
            Err(error) => {
                warn!(
                    target: DISPATCH_TARGET,
                    console = %context.name,
                    error = %error,
                    "console read failed; retrying"
                );
                context.notify(&ConsoleEvent::ReadInterrupted {
                    detail: error.to_string(),
                });
                thread::sleep(READ_ERROR_BACKOFF);
            }
        }
    }
    info!(
        target: DISPATCH_TARGET,
        console = %context.name,
        "console dispatch loop exited"
    );
}

/// Validates one raw line and invokes at most one handler.
pub(crate) fn dispatch_line(line: &str, context: &DispatchContext) -> LineOutcome {
    let parsed = match parse_line(line) {
        Ok(Some(parsed)) => parsed,
        Ok(None) => return LineOutcome::Skipped,
        Err(error) => {
            warn!(
                target: DISPATCH_TARGET,
                console = %context.name,
                error = %error,
                "command not recognized; proper syntax is <command> -<flag> (ex: print -hello)"
            );
            return LineOutcome::Malformed;
        }
    };
    let Some(handler) = context.registry.lookup(&parsed.command) else {
        warn!(
            target: DISPATCH_TARGET,
            console = %context.name,
            command = %parsed.command,
            "command not recognized; check usage and try again"
        );
        return LineOutcome::Unknown;
    };
    debug!(
        target: DISPATCH_TARGET,
        console = %context.name,
        command = %parsed.command,
        flags = ?parsed.flags,
        "dispatching command"
    );
    match panic::catch_unwind(AssertUnwindSafe(|| handler(&parsed.flags))) {
        Ok(Ok(())) => LineOutcome::Dispatched,
        Ok(Err(error)) => {
            warn!(
                target: DISPATCH_TARGET,
                console = %context.name,
                command = %parsed.command,
                error = %error,
                "there was a problem with the specified command"
            );
            LineOutcome::HandlerFailed
        }
        Err(payload) => {
            warn!(
                target: DISPATCH_TARGET,
                console = %context.name,
                command = %parsed.command,
                panic = panic_detail(payload.as_ref()),
                "there was a problem with the specified command"
            );
            LineOutcome::HandlerFailed
        }
    }
}

fn panic_detail(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("opaque panic payload")
}
