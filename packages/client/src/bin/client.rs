//! CLI chat client for the Hiroba relay.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-client -- --user-id alice
//! ```

use clap::Parser;
use hiroba_client::ClientConfig;
use hiroba_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let config = ClientConfig::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    tracing::info!("Connecting as client with user_id: {}", config.user_id);
    if let Err(e) = hiroba_client::run_client(config).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
