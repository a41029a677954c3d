//! Command registry mapping command names to handlers.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Result returned by a command handler. A returned error is caught at
/// the dispatch loop boundary and reported as a warning diagnostic.
pub type HandlerResult = anyhow::Result<()>;

/// Shared handle to a registered command handler.
pub type Handler = Arc<dyn Fn(&[String]) -> HandlerResult + Send + Sync>;

/// Mapping from command names to handlers.
///
/// All operations lock an interior mutex, so registration, removal, and
/// lookup may be called from any thread, including concurrently with the
/// dispatch worker. [`CommandRegistry::lookup`] clones the handler handle
/// and releases the lock before the caller invokes it, so a handler may
/// itself register or unregister commands without deadlocking.
#[derive(Default)]
pub struct CommandRegistry {
    commands: Mutex<HashMap<String, Handler>>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `name`, replacing any prior handler for
    /// the same name. Flags are passed to the handler without the leading
    /// marker.
    pub fn register<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(&[String]) -> HandlerResult + Send + Sync + 'static,
    {
        self.commands().insert(name.into(), Arc::new(handler));
    }

    /// Removes the handler registered under `name`, if any.
    pub fn unregister(&self, name: &str) {
        self.commands().remove(name);
    }

    /// Removes every registration.
    pub fn clear(&self) {
        self.commands().clear();
    }

    /// Returns the handler registered under `name`, if any.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Handler> {
        self.commands().get(name).cloned()
    }

    /// Number of registered commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands().len()
    }

    /// Whether the registry holds no registrations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands().is_empty()
    }

    fn commands(&self) -> MutexGuard<'_, HashMap<String, Handler>> {
        // A poisoned map still holds consistent entries; recover it.
        self.commands.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.commands().keys().cloned().collect();
        f.debug_struct("CommandRegistry")
            .field("commands", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::CommandRegistry;

    fn counting_handler(
        counter: &Arc<AtomicUsize>,
    ) -> impl Fn(&[String]) -> anyhow::Result<()> + use<> {
        let counter = Arc::clone(counter);
        move |_flags| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn lookup_returns_registered_handler() {
        let registry = CommandRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        registry.register("print", counting_handler(&counter));

        let handler = registry.lookup("print").expect("handler should exist");
        handler(&[]).expect("handler should succeed");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn lookup_of_unknown_name_is_absent() {
        let registry = CommandRegistry::new();
        assert!(registry.lookup("missing").is_none());
    }

    #[test]
    fn reregistering_replaces_the_handler() {
        let registry = CommandRegistry::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        registry.register("print", counting_handler(&first));
        registry.register("print", counting_handler(&second));

        let handler = registry.lookup("print").expect("handler should exist");
        handler(&[]).expect("handler should succeed");
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unregister_removes_only_the_named_command() {
        let registry = CommandRegistry::new();
        registry.register("print", |_flags| Ok(()));
        registry.register("status", |_flags| Ok(()));

        registry.unregister("print");
        assert!(registry.lookup("print").is_none());
        assert!(registry.lookup("status").is_some());
    }

    #[test]
    fn unregistering_an_unknown_name_is_a_noop() {
        let registry = CommandRegistry::new();
        registry.register("print", |_flags| Ok(()));
        registry.unregister("missing");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn clear_empties_the_registry() {
        let registry = CommandRegistry::new();
        registry.register("print", |_flags| Ok(()));
        registry.register("status", |_flags| Ok(()));

        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.lookup("print").is_none());
    }
}
