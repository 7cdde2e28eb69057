//! Logging init: formatted output to stderr, filtered by `RUST_LOG`.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Library crates log through the `log`
/// facade, which the subscriber picks up via its `tracing-log` bridge.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
