//! In-memory implementations.

mod registry;

pub use registry::InMemoryConnectionRegistry;
