// Tracing bootstrap, shared by every binary in the workspace.
use tracing_subscriber::EnvFilter;

/// Installs a `tracing_subscriber::fmt` layer with an env-filter default
/// tuned for this workspace. `RUST_LOG` overrides it when set.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter.to_string()));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
