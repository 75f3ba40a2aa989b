//! Single-room WebSocket broadcast relay.
//!
//! Peers join with a user id; anything an identified peer broadcasts is relayed
//! to every other identified peer.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;

// Re-export entry points
pub use config::ServerConfig;
pub use ui::run;
