use tracing_subscriber::{fmt, EnvFilter};

/// Initialises the global tracing subscriber. `RUST_LOG` wins over the
/// supplied default level. Safe to call once per process; embedders with
/// their own subscriber should skip this.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
