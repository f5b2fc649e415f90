use super::*;

#[test]
fn trace_macros_compile() {
    // no-ops without the tracing feature
    trace!("trace message");
    debug!(steps = 3, "debug message");
    info!("info message");
    warn!("warn message");

    let _entered = debug_span!("entered_span", value = 42).entered();
    let _inner = trace_span!("inner").entered();
}

#[test]
fn init_subscriber_is_idempotent() {
    init_subscriber();
    init_subscriber();
}

#[cfg(not(feature = "tracing"))]
#[test]
fn flamegraph_guard_without_tracing() {
    let guard = init_flamegraph("unused.folded");
    assert!(guard.is_ok());
    assert!(!std::path::Path::new("unused.folded").exists());
}
