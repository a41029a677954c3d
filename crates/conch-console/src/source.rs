//! Line-oriented input sources for the dispatch loop.
//!
//! The loop never parks indefinitely on a source that can bound its
//! waits: it polls with a short window and re-checks the shutdown flag
//! between polls. Sources that cannot bound a read (plain readers) block
//! until the next line, so cancellation takes effect at that point.

use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// Outcome of one bounded wait on an input source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinePoll {
    /// A complete line, without its trailing newline.
    Line(String),
    /// Nothing arrived within the wait window.
    TimedOut,
    /// The source is exhausted; no further lines will ever arrive.
    Closed,
}

/// Line-oriented input source consumed by the dispatch loop.
pub trait LineSource: Send {
    /// Waits up to `wait` for the next line.
    ///
    /// Implementations should honour the bound where their transport
    /// allows it; genuinely blocking sources may ignore it and document
    /// that cancellation is observed at the next line.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error for transient read failures; the
    /// dispatch loop logs these, notifies the observer, and retries.
    fn poll_line(&mut self, wait: Duration) -> io::Result<LinePoll>;
}

/// Source fed from an in-process channel.
///
/// This is the canonical cooperative source: waits are bounded by
/// `recv_timeout`, and dropping every sender closes the source.
#[derive(Debug)]
pub struct ChannelLineSource {
    receiver: Receiver<String>,
}

impl ChannelLineSource {
    /// Creates a source and the sender used to feed it lines.
    #[must_use]
    pub fn new() -> (Sender<String>, Self) {
        let (sender, receiver) = mpsc::channel();
        (sender, Self { receiver })
    }
}

impl LineSource for ChannelLineSource {
    fn poll_line(&mut self, wait: Duration) -> io::Result<LinePoll> {
        match self.receiver.recv_timeout(wait) {
            Ok(line) => Ok(LinePoll::Line(line)),
            Err(RecvTimeoutError::Timeout) => Ok(LinePoll::TimedOut),
            Err(RecvTimeoutError::Disconnected) => Ok(LinePoll::Closed),
        }
    }
}

/// Source reading from any buffered reader (stdin, files, pipes).
///
/// `read_line` cannot be bounded, so the wait window is ignored and a
/// pending `stop()` is only observed once the next line (or end of
/// stream) arrives.
#[derive(Debug)]
pub struct ReaderLineSource<R> {
    reader: R,
}

impl<R> ReaderLineSource<R>
where
    R: BufRead + Send,
{
    /// Wraps a buffered reader.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R> LineSource for ReaderLineSource<R>
where
    R: BufRead + Send,
{
    fn poll_line(&mut self, _wait: Duration) -> io::Result<LinePoll> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(LinePoll::Closed);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(LinePoll::Line(line))
    }
}
