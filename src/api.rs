//! HTTP API for Flashy
//!
//! A platform-neutral webhook: the transport adapter posts one update per
//! request and renders the returned reply.

mod handlers;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::db::Database;
use crate::runtime::{DatabaseStorage, ProductionManager};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<ProductionManager>,
}

impl AppState {
    pub fn new(db: Database, page_size: usize) -> Self {
        Self {
            manager: Arc::new(ProductionManager::new(DatabaseStorage::new(db), page_size)),
        }
    }
}
