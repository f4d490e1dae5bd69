//! Shared fixtures for unit tests.

use crate::config::{AuthConfig, StorageConfig};
use crate::errors::{ServiceError, ServiceResult};
use crate::services::object_store::{ObjectStore, SpooledFile, StoredObject};
use crate::state::AppState;
use crate::utils::generate_random_string::generate_random_string;
use crate::utils::jwt::TokenService;
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        access_token_secret: "test-access-secret".to_string(),
        access_token_expiry_seconds: 900,
        refresh_token_secret: "test-refresh-secret".to_string(),
        refresh_token_expiry_seconds: 86_400,
        bcrypt_cost: 4,
        cookie_secure: true,
    }
}

pub fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("account-backend-{}", generate_random_string(12)));
    std::fs::create_dir_all(&dir).expect("scratch dir");
    dir
}

pub fn test_storage_config() -> StorageConfig {
    let dir = scratch_dir();
    StorageConfig {
        upload_dir: dir.join("temp"),
        upload_url: None,
        upload_api_key: None,
        upload_preset: None,
        upload_timeout_seconds: 5,
        media_dir: dir.join("media"),
        media_base_url: "https://cdn.test/media".to_string(),
    }
}

/// Writes `bytes` to a fresh temp file wrapped as a spooled upload.
pub fn spool(bytes: &[u8]) -> SpooledFile {
    let path = scratch_dir().join("upload.png");
    std::fs::write(&path, bytes).expect("spool write");
    SpooledFile::new(path)
}

/// Object store returning `https://cdn.test/<n>` for the n-th upload.
#[derive(Default)]
pub struct StubObjectStore {
    uploads: AtomicUsize,
    fail: bool,
}

impl StubObjectStore {
    pub fn failing() -> Self {
        Self {
            uploads: AtomicUsize::new(0),
            fail: true,
        }
    }

    /// Number of successful uploads so far.
    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for StubObjectStore {
    async fn upload(&self, file: &Path) -> ServiceResult<StoredObject> {
        if self.fail || !file.exists() {
            return Err(ServiceError::external_service("stub upload failure"));
        }
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(StoredObject {
            url: format!("https://cdn.test/{n}"),
        })
    }
}

pub fn test_state(pool: SqlitePool) -> Arc<AppState> {
    let auth = test_auth_config();
    Arc::new(AppState {
        pool,
        tokens: TokenService::new(&auth),
        object_store: Arc::new(StubObjectStore::default()),
        auth,
        storage: test_storage_config(),
    })
}
