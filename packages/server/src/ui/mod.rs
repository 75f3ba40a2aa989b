//! WebSocket relay server: handlers, state and the serve loop.

mod handler;
mod runner;
mod signal;
pub mod state;

pub use runner::{ServerError, build_router, run, serve};
pub use signal::shutdown_signal;
