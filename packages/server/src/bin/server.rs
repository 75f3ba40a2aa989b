//! WebSocket broadcast relay server.
//!
//! Registers clients by user id and relays each broadcast to all other clients.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-server -- --port 8765
//! ```

use clap::Parser;
use hiroba_server::ServerConfig;
use hiroba_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    // Run the server
    if let Err(e) = hiroba_server::run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
