use std::sync::Arc;

use items_core::registry::FieldRegistry;
use tokio::sync::RwLock;

use crate::config::ServerConfig;
use crate::store::RecordStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Items fields, read-only after boot.
    pub fields: Arc<FieldRegistry>,
    pub records: Arc<RwLock<RecordStore>>,
}

impl AppState {
    pub fn new(config: ServerConfig, fields: FieldRegistry) -> Self {
        Self {
            config: Arc::new(config),
            fields: Arc::new(fields),
            records: Arc::new(RwLock::new(RecordStore::default())),
        }
    }
}
