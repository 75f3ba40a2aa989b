//! CLI client for the Hiroba broadcast relay.
//!
//! [`ClientSession`] owns one connection: it sends `join` on connect, runs a
//! receive loop that parses server messages into an inbound buffer, and sends
//! broadcasts / disconnect on request. [`run_client`] drives a session
//! interactively from the terminal.

pub mod config;
pub mod error;
pub mod input;
pub mod render;
pub mod runner;
pub mod session;

// Re-export entry points
pub use config::ClientConfig;
pub use error::ClientError;
pub use runner::{Exit, chat, run_client};
pub use session::ClientSession;
