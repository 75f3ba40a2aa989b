//! Domain layer for the relay.
//!
//! This module contains the registry model that is independent of
//! wire formats (DTOs) and infrastructure concerns.

pub mod connection;
pub mod entity;
pub mod error;
pub mod factory;
pub mod repository;
pub mod value_object;

pub use connection::{ConnectionHandle, Mailbox, OutboundFrame};
pub use entity::Participant;
pub use error::{DeliveryError, ValueObjectError};
pub use factory::ConnectionIdFactory;
pub use repository::{ConnectionRegistry, Recipient};
pub use value_object::{ConnectionId, Timestamp, UserId};

#[cfg(test)]
pub use repository::MockConnectionRegistry;
