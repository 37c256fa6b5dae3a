//! Diagnostic tracing for `vibes` itself.
//!
//! Prompts go to stdout; everything emitted here goes to stderr and is
//! silent unless `RUST_LOG` asks for it.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber.
///
/// Filter comes from `RUST_LOG`, falling back to `warn`. Safe to call more
/// than once; later calls are ignored.
///
/// ```bash
/// RUST_LOG=vibes=debug vibes next
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false).compact())
        .try_init();
}
