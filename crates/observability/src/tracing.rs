//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Default directive when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// JSON logs with timestamps, filtered through `RUST_LOG`.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(true)
        .with_current_span(false)
        .try_init();
}
