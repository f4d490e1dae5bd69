//! Multipart form parsing.
//!
//! Text parts are collected by name; file parts are written to the upload
//! directory under random names and handed out as [`SpooledFile`]s, which
//! delete themselves once the request is done with them.

use crate::api::common::ApiError;
use crate::services::object_store::SpooledFile;
use crate::utils::generate_random_string::{generate_random_string, safe_extension};
use axum::extract::{Multipart, multipart::MultipartError};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, error};

/// Keeps the status axum picked, so an oversized body stays a 413.
fn multipart_error(error: MultipartError) -> ApiError {
    debug!("Rejected multipart body: {}", error);
    ApiError::new(error.status(), error.body_text())
}

#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, SpooledFile>,
}

impl MultipartForm {
    /// Reads every part of `multipart`, spooling the parts named in
    /// `file_fields` into `upload_dir`. Empty file parts count as absent.
    pub async fn read(
        mut multipart: Multipart,
        file_fields: &[&str],
        upload_dir: &Path,
    ) -> Result<Self, ApiError> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(multipart_error)?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if file_fields.contains(&name.as_str()) {
                let extension = field.file_name().map(safe_extension).unwrap_or_default();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                if bytes.is_empty() || form.files.contains_key(&name) {
                    continue;
                }

                tokio::fs::create_dir_all(upload_dir).await.map_err(|e| {
                    error!("Cannot create upload dir {}: {}", upload_dir.display(), e);
                    ApiError::new(
                        axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                        "Could not store upload",
                    )
                })?;
                let path = upload_dir.join(format!("{}{}", generate_random_string(24), extension));
                tokio::fs::write(&path, &bytes).await.map_err(|e| {
                    error!("Cannot spool upload to {}: {}", path.display(), e);
                    ApiError::new(
                        axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                        "Could not store upload",
                    )
                })?;
                debug!("Spooled {} ({} bytes) to {}", name, bytes.len(), path.display());
                form.files.insert(name, SpooledFile::new(path));
            } else {
                let value = field.text().await.map_err(multipart_error)?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Removes and returns a text field, or an empty string when absent.
    pub fn take_text(&mut self, name: &str) -> String {
        self.fields.remove(name).unwrap_or_default()
    }

    pub fn take_file(&mut self, name: &str) -> Option<SpooledFile> {
        self.files.remove(name)
    }
}
