//! Lifecycle controller owning the dispatch worker.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use conch_config::ConsoleSettings;
use tracing::{info, warn};

use crate::dispatch::{DispatchContext, run_dispatch_loop};
use crate::errors::ConsoleError;
use crate::events::{ConsoleEvent, ConsoleObserver};
use crate::registry::{CommandRegistry, HandlerResult};
use crate::source::LineSource;

/// Tracing target for lifecycle diagnostics.
pub(crate) const CONSOLE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::console");

/// Lifecycle states of a console instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConsoleState {
    /// Constructed (or reset) and not yet started.
    #[default]
    Idle,
    /// The dispatch worker is accepting lines.
    Running,
    /// Stop was requested; `start` re-enters `Running`.
    Stopped,
    /// Resources released; the instance cannot be restarted.
    Destroyed,
}

struct Runtime {
    state: ConsoleState,
    shutdown: Option<Arc<AtomicBool>>,
    worker: Option<JoinHandle<()>>,
}

/// An asynchronous line-command console.
///
/// The console reads lines from its input source on a dedicated worker
/// thread, so the constructing thread is never blocked. Each line is
/// split into a command name and flag tokens, validated, and dispatched
/// to the handler registered under that name. Registration and lifecycle
/// operations may be called from any thread.
///
/// State moves `Idle -> Running -> Stopped`; [`Console::start`] after a
/// stop re-enters `Running` with registrations intact, and only
/// [`Console::reset`] clears them. All state is held by the instance;
/// two consoles never interfere with each other.
pub struct Console {
    name: String,
    registry: Arc<CommandRegistry>,
    observer: Option<Arc<dyn ConsoleObserver>>,
    pacing: Arc<Mutex<Option<Duration>>>,
    default_pacing: Option<Duration>,
    source: Arc<Mutex<Option<Box<dyn LineSource>>>>,
    working_dir: Mutex<Option<Utf8PathBuf>>,
    runtime: Mutex<Runtime>,
}

impl Console {
    /// Builds a console over `source` without a lifecycle observer.
    #[must_use]
    pub fn new(settings: &ConsoleSettings, source: impl LineSource + 'static) -> Self {
        Self::build(settings, Box::new(source), None)
    }

    /// Builds a console that reports lifecycle events to `observer`.
    #[must_use]
    pub fn with_observer(
        settings: &ConsoleSettings,
        source: impl LineSource + 'static,
        observer: Arc<dyn ConsoleObserver>,
    ) -> Self {
        Self::build(settings, Box::new(source), Some(observer))
    }

    fn build(
        settings: &ConsoleSettings,
        source: Box<dyn LineSource>,
        observer: Option<Arc<dyn ConsoleObserver>>,
    ) -> Self {
        Self {
            name: settings.name().to_owned(),
            registry: Arc::new(CommandRegistry::new()),
            observer,
            pacing: Arc::new(Mutex::new(settings.poll_interval())),
            default_pacing: settings.poll_interval(),
            source: Arc::new(Mutex::new(Some(source))),
            working_dir: Mutex::new(None),
            runtime: Mutex::new(Runtime {
                state: ConsoleState::Idle,
                shutdown: None,
                worker: None,
            }),
        }
    }

    /// Name identifying this console in diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state as seen by the controller.
    #[must_use]
    pub fn state(&self) -> ConsoleState {
        self.runtime_guard().state
    }

    /// The registry backing this console, for direct manipulation.
    #[must_use]
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Registers `handler` under `name`; replaces any prior handler.
    pub fn register<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(&[String]) -> HandlerResult + Send + Sync + 'static,
    {
        self.registry.register(name, handler);
    }

    /// Removes the handler registered under `name`, if any.
    pub fn unregister(&self, name: &str) {
        self.registry.unregister(name);
    }

    /// Sets or clears the pacing interval applied before each read.
    /// Takes effect on the worker's next iteration.
    pub fn set_poll_interval(&self, interval: Option<Duration>) {
        *self.pacing.lock().unwrap_or_else(PoisonError::into_inner) = interval;
    }

    /// The pacing interval currently in effect, if any.
    #[must_use]
    pub fn poll_interval(&self) -> Option<Duration> {
        *self.pacing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records `path` as the working directory when it names an existing
    /// directory; otherwise logs a warning and keeps the prior value.
    pub fn set_working_directory(&self, path: impl AsRef<Utf8Path>) {
        let path = path.as_ref();
        if path.as_std_path().is_dir() {
            *self.working_dir_guard() = Some(path.to_path_buf());
        } else {
            warn!(
                target: CONSOLE_TARGET,
                console = %self.name,
                path = %path,
                "not a valid directory"
            );
        }
    }

    /// The working directory recorded for this console, if any.
    #[must_use]
    pub fn working_directory(&self) -> Option<Utf8PathBuf> {
        self.working_dir_guard().clone()
    }

    /// Starts the dispatch worker.
    ///
    /// Idempotent while `Running`. After a stop, the previous worker is
    /// joined before a fresh one is spawned, so with a blocking source
    /// this may wait until that worker observes the next line.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Destroyed`] after [`Console::destroy`],
    /// [`ConsoleError::Spawn`] when the thread cannot be created, and
    /// [`ConsoleError::WorkerPanicked`] when the previous worker died
    /// panicking.
    pub fn start(&self) -> Result<(), ConsoleError> {
        // Join the old worker with the runtime lock released; the worker
        // may be inside a handler that takes the lock itself (stop()).
        let stale = {
            let mut runtime = self.runtime_guard();
            match runtime.state {
                ConsoleState::Destroyed => {
                    return Err(ConsoleError::Destroyed {
                        name: self.name.clone(),
                    });
                }
                ConsoleState::Running => return Ok(()),
                ConsoleState::Idle | ConsoleState::Stopped => {}
            }
            runtime.worker.take()
        };
        join_worker(stale)?;

        let mut runtime = self.runtime_guard();
        // Another thread may have raced us while the lock was released.
        match runtime.state {
            ConsoleState::Destroyed => {
                return Err(ConsoleError::Destroyed {
                    name: self.name.clone(),
                });
            }
            ConsoleState::Running => return Ok(()),
            ConsoleState::Idle | ConsoleState::Stopped => {}
        }

        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let shared_source = Arc::clone(&self.source);
        let context = DispatchContext {
            name: self.name.clone(),
            registry: Arc::clone(&self.registry),
            observer: self.observer.clone(),
            pacing: Arc::clone(&self.pacing),
        };
        let worker = thread::Builder::new()
            .name(format!("{}-console", self.name))
            .spawn(move || {
                let mut guard = shared_source
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                if let Some(active) = guard.as_mut() {
                    run_dispatch_loop(active.as_mut(), &flag, &context);
                }
            })
            .map_err(|error| ConsoleError::Spawn { source: error })?;

        runtime.shutdown = Some(shutdown);
        runtime.worker = Some(worker);
        runtime.state = ConsoleState::Running;
        drop(runtime);

        info!(target: CONSOLE_TARGET, console = %self.name, "console initialized");
        self.notify(&ConsoleEvent::Started);
        Ok(())
    }

    /// Requests cooperative shutdown of the dispatch worker.
    ///
    /// The worker exits at its next shutdown check; a handler already
    /// executing is never aborted. Registrations survive a stop. Calling
    /// this while not `Running` is a no-op, and it is safe to call from
    /// inside a handler.
    pub fn stop(&self) {
        let mut runtime = self.runtime_guard();
        if runtime.state != ConsoleState::Running {
            return;
        }
        if let Some(flag) = &runtime.shutdown {
            flag.store(true, Ordering::SeqCst);
        }
        runtime.state = ConsoleState::Stopped;
        drop(runtime);

        info!(target: CONSOLE_TARGET, console = %self.name, "console stopped");
        self.notify(&ConsoleEvent::Stopped);
    }

    /// Stops the console, clears every registration, and restores the
    /// configuration supplied at construction, returning the instance to
    /// `Idle` as if newly built. The input source is retained.
    ///
    /// Joins the worker, so this must not be called from a handler.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::WorkerPanicked`] when the worker died
    /// panicking.
    pub fn reset(&self) -> Result<(), ConsoleError> {
        self.stop();
        let joined = join_worker(self.take_worker());
        {
            let mut runtime = self.runtime_guard();
            runtime.shutdown = None;
            if runtime.state != ConsoleState::Destroyed {
                runtime.state = ConsoleState::Idle;
            }
        }
        self.registry.clear();
        self.set_poll_interval(self.default_pacing);
        *self.working_dir_guard() = None;
        info!(target: CONSOLE_TARGET, console = %self.name, "console reset");
        joined
    }

    /// Stops the console and releases the worker and input source. The
    /// instance cannot be restarted afterwards.
    ///
    /// Joins the worker, so this must not be called from a handler.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::WorkerPanicked`] when the worker died
    /// panicking; the console still ends up destroyed.
    pub fn destroy(&self) -> Result<(), ConsoleError> {
        self.stop();
        let joined = join_worker(self.take_worker());
        {
            let mut runtime = self.runtime_guard();
            runtime.shutdown = None;
            runtime.state = ConsoleState::Destroyed;
        }
        *self.source.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.registry.clear();
        info!(target: CONSOLE_TARGET, console = %self.name, "console destroyed");
        joined
    }

    fn notify(&self, event: &ConsoleEvent) {
        if let Some(observer) = &self.observer {
            observer.on_event(&self.name, event);
        }
    }

    fn runtime_guard(&self) -> MutexGuard<'_, Runtime> {
        self.runtime.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_worker(&self) -> Option<JoinHandle<()>> {
        self.runtime_guard().worker.take()
    }

    fn working_dir_guard(&self) -> MutexGuard<'_, Option<Utf8PathBuf>> {
        self.working_dir
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        // Signal the worker so it does not outlive the console; joining
        // here could block, so the thread is left to exit on its own.
        let runtime = self.runtime_guard();
        if let Some(flag) = &runtime.shutdown {
            flag.store(true, Ordering::SeqCst);
        }
    }
}

// Must be called without the runtime lock held: the worker may be inside
// a handler that calls stop(), which takes that lock.
fn join_worker(worker: Option<JoinHandle<()>>) -> Result<(), ConsoleError> {
    let Some(worker) = worker else {
        return Ok(());
    };
    worker.join().map_err(|_panic| ConsoleError::WorkerPanicked)
}
