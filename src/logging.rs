use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs a stderr subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` (e.g. `fleetmap=info`).
///
/// Only binaries call this; the library just emits events.
pub fn init_logging(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let console_layer = fmt::layer().compact().with_writer(std::io::stderr);

    // Ignore the error if a subscriber is already set (tests, embedding hosts)
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init();
}
