//! Infrastructure layer: wire formats and registry storage.

pub mod dto;
pub mod repository;
