//! Tracing subscriber setup shared by the server and client binaries.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Build the default filter directive for a binary.
///
/// Package names use `-` but tracing targets use `_`, so `hiroba-server` becomes
/// `hiroba_server=debug,hiroba_shared=debug,tower_http=debug`.
pub fn default_directive(bin_name: &str, level: &str) -> String {
    let target = bin_name.replace('-', "_");
    format!("{target}={level},hiroba_shared={level},tower_http={level}")
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise [`default_directive`] is used.
/// Logs go to stderr so that the client's chat output on stdout stays readable.
pub fn setup_logger(bin_name: &str, default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(bin_name, default_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(true)
                .with_writer(std::io::stderr),
        )
        .init();
}
