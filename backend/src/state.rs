//! Shared application state handed to every handler.

use crate::config::{AuthConfig, StorageConfig};
use crate::services::object_store::ObjectStore;
use crate::utils::jwt::TokenService;
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct AppState {
    pub pool: SqlitePool,
    pub tokens: TokenService,
    pub object_store: Arc<dyn ObjectStore>,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
}
