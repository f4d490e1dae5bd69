//! Password hashing and refresh-token digests.
//!
//! Passwords go through bcrypt with a per-hash random salt embedded in the
//! output. Refresh tokens are stored as SHA-256 digests so the database
//! never holds a usable token.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let hash = hash_password("secret".to_string(), 12).await?;
//! assert!(verify_password("secret".to_string(), hash).await?);
//! ```

use crate::errors::{ServiceError, ServiceResult};
use sha2::{Digest, Sha256};

/// Hashes a plaintext password with bcrypt at the given cost.
///
/// Runs on the blocking pool since bcrypt is intentionally slow.
pub async fn hash_password(password: String, cost: u32) -> ServiceResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ServiceError::internal_error(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| ServiceError::internal_error(format!("Password hashing failed: {}", e)))
}

/// Checks a plaintext password against a stored bcrypt hash.
///
/// # Errors
/// Returns `ServiceError::InternalError` if the hash is malformed or the
/// verification task fails. A mismatch is `Ok(false)`.
pub async fn verify_password(password: String, hash: String) -> ServiceResult<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| {
            ServiceError::internal_error(format!("Password verification task failed: {}", e))
        })?
        .map_err(|e| ServiceError::internal_error(format!("Password verification failed: {}", e)))
}

/// Hex-encoded SHA-256 of a token, the form persisted in the session slot.
pub fn digest_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
