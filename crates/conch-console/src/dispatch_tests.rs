//! Tests for per-line dispatch behaviour.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rstest::rstest;

use crate::dispatch::{DispatchContext, LineOutcome, dispatch_line};
use crate::registry::CommandRegistry;

fn context(registry: Arc<CommandRegistry>) -> DispatchContext {
    DispatchContext {
        name: "test-console".to_owned(),
        registry,
        observer: None,
        pacing: Arc::new(Mutex::new(None)),
    }
}

fn counting(counter: &Arc<AtomicUsize>) -> impl Fn(&[String]) -> anyhow::Result<()> + use<> {
    let counter = Arc::clone(counter);
    move |_flags| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn dispatches_to_handler_with_stripped_flags() {
    let registry = Arc::new(CommandRegistry::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    registry.register("print", move |flags| {
        sink.lock().expect("seen lock").push(flags.to_vec());
        Ok(())
    });
    let ctx = context(registry);

    assert_eq!(dispatch_line("print -a -b", &ctx), LineOutcome::Dispatched);
    let captured = seen.lock().expect("seen lock");
    assert_eq!(captured.as_slice(), &[vec!["a".to_owned(), "b".to_owned()]]);
}

#[test]
fn malformed_flag_rejects_even_a_registered_command() {
    let registry = Arc::new(CommandRegistry::new());
    let counter = Arc::new(AtomicUsize::new(0));
    registry.register("print", counting(&counter));
    let ctx = context(registry);

    assert_eq!(dispatch_line("print -a b", &ctx), LineOutcome::Malformed);
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[test]
fn unknown_command_invokes_no_handler() {
    let registry = Arc::new(CommandRegistry::new());
    let counter = Arc::new(AtomicUsize::new(0));
    registry.register("print", counting(&counter));
    let ctx = context(registry);

    assert_eq!(dispatch_line("unknown -x", &ctx), LineOutcome::Unknown);
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[test]
fn empty_line_is_skipped_silently() {
    let ctx = context(Arc::new(CommandRegistry::new()));
    assert_eq!(dispatch_line("", &ctx), LineOutcome::Skipped);
}

#[test]
fn failing_handler_is_contained_and_later_lines_dispatch() {
    let registry = Arc::new(CommandRegistry::new());
    let counter = Arc::new(AtomicUsize::new(0));
    registry.register("boom", |_flags| Err(anyhow::anyhow!("handler exploded")));
    registry.register("print", counting(&counter));
    let ctx = context(registry);

    assert_eq!(dispatch_line("boom", &ctx), LineOutcome::HandlerFailed);
    assert_eq!(dispatch_line("print -a", &ctx), LineOutcome::Dispatched);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn panicking_handler_is_contained_and_later_lines_dispatch() {
    let registry = Arc::new(CommandRegistry::new());
    let counter = Arc::new(AtomicUsize::new(0));
    registry.register("boom", |_flags| -> anyhow::Result<()> {
        panic!("handler exploded")
    });
    registry.register("print", counting(&counter));
    let ctx = context(registry);

    assert_eq!(dispatch_line("boom", &ctx), LineOutcome::HandlerFailed);
    assert_eq!(dispatch_line("print -a", &ctx), LineOutcome::Dispatched);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[rstest]
#[case("print -", vec![String::new()])]
#[case("print", Vec::new())]
#[case("print -a -a", vec!["a".to_owned(), "a".to_owned()])]
fn flag_edge_cases_reach_the_handler(#[case] line: &str, #[case] expected: Vec<String>) {
    let registry = Arc::new(CommandRegistry::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    registry.register("print", move |flags| {
        sink.lock().expect("seen lock").push(flags.to_vec());
        Ok(())
    });
    let ctx = context(registry);

    assert_eq!(dispatch_line(line, &ctx), LineOutcome::Dispatched);
    let captured = seen.lock().expect("seen lock");
    assert_eq!(captured.as_slice(), &[expected]);
}
