//! Object store for avatars and cover images.
//!
//! Uploaded multipart parts are first spooled to a local file; a store then
//! turns that file into a durable URL. Two implementations exist: an HTTP
//! image host and a local media directory used when no host is configured.

use crate::config::StorageConfig;
use crate::errors::{ServiceError, ServiceResult};
use crate::utils::generate_random_string::{generate_random_string, safe_extension};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Where an uploaded file ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub url: String,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads a local file and returns its public URL.
    async fn upload(&self, file: &Path) -> ServiceResult<StoredObject>;
}

/// A file written to the upload directory that is removed when dropped.
#[derive(Debug)]
pub struct SpooledFile {
    path: PathBuf,
}

impl SpooledFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SpooledFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove spooled file {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Best-effort upload: failures are logged and yield `None`.
pub async fn upload_spooled(store: &dyn ObjectStore, file: Option<&SpooledFile>) -> Option<String> {
    let file = file?;
    match store.upload(file.path()).await {
        Ok(object) => Some(object.url),
        Err(e) => {
            error!("Upload of {} failed: {}", file.path().display(), e);
            None
        }
    }
}

/// Picks the remote store when an upload URL is configured, otherwise the
/// local media directory.
pub fn build_object_store(config: &StorageConfig) -> ServiceResult<Arc<dyn ObjectStore>> {
    match &config.upload_url {
        Some(upload_url) => {
            info!("Using remote object store at {}", upload_url);
            Ok(Arc::new(HttpObjectStore::new(config, upload_url)?))
        }
        None => {
            info!("Using local object store in {}", config.media_dir.display());
            Ok(Arc::new(LocalObjectStore::new(
                config.media_dir.clone(),
                config.media_base_url.clone(),
            )))
        }
    }
}

/// Uploads files to an image host via multipart POST.
pub struct HttpObjectStore {
    client: reqwest::Client,
    upload_url: String,
    api_key: Option<String>,
    upload_preset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadReply {
    secure_url: Option<String>,
    url: Option<String>,
}

impl HttpObjectStore {
    pub fn new(config: &StorageConfig, upload_url: &str) -> ServiceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upload_timeout_seconds))
            .build()
            .map_err(|e| ServiceError::internal_error(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            client,
            upload_url: upload_url.to_string(),
            api_key: config.upload_api_key.clone(),
            upload_preset: config.upload_preset.clone(),
        })
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn upload(&self, file: &Path) -> ServiceResult<StoredObject> {
        let bytes = tokio::fs::read(file).await.map_err(|e| {
            ServiceError::internal_error(format!("Cannot read {}: {}", file.display(), e))
        })?;
        let file_name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let mut form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        if let Some(api_key) = &self.api_key {
            form = form.text("api_key", api_key.clone());
        }
        if let Some(preset) = &self.upload_preset {
            form = form.text("upload_preset", preset.clone());
        }

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ServiceError::external_service(format!("Upload failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ServiceError::external_service(format!(
                "Upload rejected with status {}",
                response.status()
            )));
        }

        let reply: UploadReply = response.json().await.map_err(|e| {
            ServiceError::external_service(format!("Unreadable upload reply: {}", e))
        })?;

        reply
            .secure_url
            .or(reply.url)
            .map(|url| StoredObject { url })
            .ok_or_else(|| ServiceError::external_service("Upload reply has no url"))
    }
}

/// Copies files into a local media directory.
pub struct LocalObjectStore {
    media_dir: PathBuf,
    base_url: String,
}

impl LocalObjectStore {
    pub fn new(media_dir: PathBuf, base_url: String) -> Self {
        Self {
            media_dir,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn upload(&self, file: &Path) -> ServiceResult<StoredObject> {
        let extension = file
            .file_name()
            .map(|name| safe_extension(&name.to_string_lossy()))
            .unwrap_or_default();
        let object_name = format!("{}{}", generate_random_string(24), extension);

        tokio::fs::create_dir_all(&self.media_dir).await.map_err(|e| {
            ServiceError::internal_error(format!("Cannot create media dir: {}", e))
        })?;
        tokio::fs::copy(file, self.media_dir.join(&object_name))
            .await
            .map_err(|e| {
                ServiceError::external_service(format!("Cannot store {}: {}", file.display(), e))
            })?;

        Ok(StoredObject {
            url: format!("{}/{}", self.base_url, object_name),
        })
    }
}
