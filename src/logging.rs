//! Diagnostic tracing
//!
//! User-facing output (progress, summaries, reports) is printed by the
//! commands. Library internals emit `tracing` events, shown on stderr
//! according to `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the stderr subscriber
///
/// Reads `RUST_LOG`, defaulting to `warn`. `verbose` raises the default to
/// `modsync=debug`.
///
/// ```bash
/// RUST_LOG=modsync=debug modsync update --all
/// ```
pub fn init(verbose: bool) {
  let default = if verbose { "modsync=debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  let _ = tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(std::io::stderr).compact())
    .try_init();
}
