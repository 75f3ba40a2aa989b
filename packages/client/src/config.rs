//! Client configuration from the command line and environment.

use clap::Parser;
use hiroba_server::config::{DEFAULT_HOST, DEFAULT_PORT};

/// Connect to a Hiroba relay server and chat from the terminal.
///
/// Type a line to broadcast it; `/exit` leaves the room.
#[derive(Debug, Clone, Parser)]
#[command(name = "hiroba-client", version, about)]
pub struct ClientConfig {
    /// Unique user ID
    #[arg(short = 'u', long = "user-id")]
    pub user_id: String,

    /// Server host
    #[arg(long, env = "WEBSOCKET_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Server port
    #[arg(short, long, env = "WEBSOCKET_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

impl ClientConfig {
    /// WebSocket URL of the server.
    pub fn url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }
}
