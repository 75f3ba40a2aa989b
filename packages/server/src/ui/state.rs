//! Server state shared by every handler.

use std::sync::Arc;

use crate::{domain::ConnectionRegistry, infrastructure::repository::InMemoryConnectionRegistry};

/// Shared application state
pub struct AppState {
    /// Registry（データアクセス層の抽象化）
    pub registry: Arc<dyn ConnectionRegistry>,
}

impl AppState {
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }
}

impl Default for AppState {
    /// State backed by a fresh, empty in-memory registry.
    fn default() -> Self {
        Self::new(Arc::new(InMemoryConnectionRegistry::new()))
    }
}
