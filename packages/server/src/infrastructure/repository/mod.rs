//! Registry implementations.
//!
//! Concrete implementations of the domain layer's `ConnectionRegistry` trait.
//! The use case layer depends on the trait, not on these types.

pub mod inmemory;

pub use inmemory::InMemoryConnectionRegistry;
