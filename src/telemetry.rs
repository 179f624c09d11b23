//! Tracing subscriber setup.
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` drives filtering (default `info`); dev mode switches
/// to the multi-line pretty layout. Calling it twice is harmless.
pub fn init(dev_mode: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if dev_mode {
        builder.pretty().try_init()
    } else {
        builder.compact().with_target(false).try_init()
    };
    if let Err(e) = installed {
        tracing::debug!(error = %e, "subscriber already installed");
    }
}
