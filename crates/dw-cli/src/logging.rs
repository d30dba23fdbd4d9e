use tracing_subscriber::{fmt, EnvFilter};

/// Initialize logging with human-readable output on stderr.
///
/// Day announcements own stdout, so diagnostics go to stderr. Uses the
/// `RUST_LOG` environment variable if set, otherwise `default_level`.
///
/// Safe to call multiple times -- subsequent calls are no-ops.
pub fn init(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .try_init()
        .ok();
}
