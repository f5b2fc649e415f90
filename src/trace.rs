//! Feature-gated tracing macros.
//!
//! With the `tracing` feature the macros come from the tracing crate. Without
//! it they expand to nothing, so call sites guarded by
//! `#[cfg(feature = "tracing")]` and unguarded ones cost the same: nothing.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::trace::{debug, debug_span, trace};
//!
//! fn sum_out(&self) {
//!     let _span = debug_span!("sum_out", prv = %prv).entered();
//!     trace!(before, after, "exponents");
//!     debug!(result = %summed, "sum_out_done");
//! }
//! ```

#[cfg(feature = "tracing")]
pub use tracing::{debug, debug_span, info, trace, trace_span, warn, Span};

#[cfg(not(feature = "tracing"))]
mod noop {
    /// Span that records nothing.
    pub struct Span;

    impl Span {
        pub fn none() -> Self {
            Span
        }

        pub fn entered(self) -> SpanGuard {
            SpanGuard
        }
    }

    pub struct SpanGuard;

    impl Drop for SpanGuard {
        fn drop(&mut self) {}
    }

    #[macro_export]
    macro_rules! trace {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! debug {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! info {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! warn {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! debug_span {
        ($($tt:tt)*) => {
            $crate::trace::Span::none()
        };
    }

    #[macro_export]
    macro_rules! trace_span {
        ($($tt:tt)*) => {
            $crate::trace::Span::none()
        };
    }

    pub use crate::{debug, debug_span, info, trace, trace_span, warn};
}

#[cfg(not(feature = "tracing"))]
pub use noop::*;

/// Install a stderr subscriber filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once; later calls are ignored.
#[cfg(feature = "tracing")]
pub fn init_subscriber() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_ansi(false),
        )
        .with(filter)
        .try_init()
        .ok();
}

#[cfg(not(feature = "tracing"))]
pub fn init_subscriber() {}

/// Install a subscriber that writes folded stacks to `path`, e.g. to find
/// which macro-operation dominates a run.
///
/// The folded file is flushed when the returned guard is dropped.
#[cfg(feature = "tracing")]
pub fn init_flamegraph(path: &str) -> Result<impl Drop, Box<dyn std::error::Error>> {
    use tracing_flame::FlameLayer;
    use tracing_subscriber::{prelude::*, registry::Registry};

    let (flame_layer, guard) = FlameLayer::with_file(path)?;
    Registry::default().with(flame_layer).try_init()?;
    Ok(guard)
}

#[cfg(not(feature = "tracing"))]
pub fn init_flamegraph(_path: &str) -> Result<impl Drop, Box<dyn std::error::Error>> {
    struct NoopGuard;
    impl Drop for NoopGuard {
        fn drop(&mut self) {}
    }
    Ok(NoopGuard)
}

#[cfg(test)]
#[path = "tests/trace.rs"]
mod tests;
