use std::io;

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset. Keeps a successful run silent.
pub const DEFAULT_FILTER: &str = "warn";

/// Installs the global subscriber: compact lines on stderr, filtered by `RUST_LOG`.
///
/// Stdout is left alone, it carries the usage text. Calling this twice is harmless.
pub fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}
