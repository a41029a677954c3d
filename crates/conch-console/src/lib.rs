//! Asynchronous line-command console.
//!
//! A [`Console`] reads text lines from an input source on a dedicated
//! worker thread so the constructing thread never blocks. Each line is
//! split into a command name and flag tokens (`<command> -<flag> ...`),
//! validated, and dispatched synchronously to the handler registered
//! under that name. Handlers receive the flags with the leading `-`
//! stripped, in their original order.
//!
//! The crate is built from three cooperating parts:
//!
//! - [`CommandRegistry`] maps command names to handlers and is safe to
//!   mutate from any thread, including while dispatch is running.
//! - The dispatch loop (internal) reads from a [`LineSource`], skips
//!   empty lines, rejects lines with any unmarked flag token, and
//!   contains handler failures so the worker always survives.
//! - [`Console`] owns the worker: `start`, `stop`, `reset`, and
//!   `destroy` drive the `Idle -> Running -> Stopped` state machine with
//!   cooperative cancellation.
//!
//! Lifecycle events can be observed through a [`ConsoleObserver`]
//! supplied at construction; [`StructuredObserver`] records them via
//! `tracing`, and [`telemetry::initialise`] installs a subscriber for
//! hosts that do not bring their own.

mod console;
mod dispatch;
#[cfg(test)]
mod dispatch_tests;
mod errors;
mod events;
mod line;
mod registry;
mod source;
pub mod telemetry;

pub use console::{Console, ConsoleState};
pub use errors::{ConsoleError, LineError};
pub use events::{ConsoleEvent, ConsoleObserver, StructuredObserver};
pub use line::{FLAG_MARKER, ParsedLine, parse_line};
pub use registry::{CommandRegistry, Handler, HandlerResult};
pub use source::{ChannelLineSource, LinePoll, LineSource, ReaderLineSource};
pub use telemetry::{TelemetryError, TelemetryHandle};
