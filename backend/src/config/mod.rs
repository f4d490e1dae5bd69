//! Central module for application-wide configuration settings.
//!
//! This module handles loading and managing configuration parameters such as
//! the database URL, server port, token secrets and lifetimes, and where
//! uploaded files are spooled and stored.

use anyhow::{Context, Result, bail};
use expanduser::expanduser;
use std::env;
use std::path::PathBuf;

/// Longest lifetime accepted for either token kind (one year).
pub const MAX_TOKEN_EXPIRY_SECONDS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub server_port: u16,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
}

/// Settings for token issuance, password hashing and session cookies.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub access_token_secret: String,
    pub access_token_expiry_seconds: u64,
    pub refresh_token_secret: String,
    pub refresh_token_expiry_seconds: u64,
    pub bcrypt_cost: u32,
    pub cookie_secure: bool,
}

/// Settings for the object store that holds avatars and cover images.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory multipart file parts are written to before upload.
    pub upload_dir: PathBuf,
    /// Remote image host endpoint. When absent, files are kept in `media_dir`.
    pub upload_url: Option<String>,
    pub upload_api_key: Option<String>,
    pub upload_preset: Option<String>,
    pub upload_timeout_seconds: u64,
    pub media_dir: PathBuf,
    pub media_base_url: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL not set")?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .context("DB_MAX_CONNECTIONS must be a valid number")?;

        let acquire_timeout_seconds = env::var("DB_ACQUIRE_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u64>()
            .context("DB_ACQUIRE_TIMEOUT_SECONDS must be a valid number")?;

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .context("SERVER_PORT must be a valid number")?;

        let auth = AuthConfig::from_env()?;
        let storage = StorageConfig::from_env(server_port)?;

        Ok(Config {
            database_url,
            max_connections,
            acquire_timeout_seconds,
            server_port,
            auth,
            storage,
        })
    }
}

impl AuthConfig {
    fn from_env() -> Result<Self> {
        let access_token_secret =
            env::var("ACCESS_TOKEN_SECRET").context("ACCESS_TOKEN_SECRET not set")?;

        let access_token_expiry_seconds = env::var("ACCESS_TOKEN_EXPIRY_SECONDS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse::<u64>()
            .context("ACCESS_TOKEN_EXPIRY_SECONDS must be a valid number")?;

        let refresh_token_secret =
            env::var("REFRESH_TOKEN_SECRET").context("REFRESH_TOKEN_SECRET not set")?;

        let refresh_token_expiry_seconds = env::var("REFRESH_TOKEN_EXPIRY_SECONDS")
            .unwrap_or_else(|_| "864000".to_string())
            .parse::<u64>()
            .context("REFRESH_TOKEN_EXPIRY_SECONDS must be a valid number")?;

        let bcrypt_cost = env::var("BCRYPT_COST")
            .unwrap_or_else(|_| bcrypt::DEFAULT_COST.to_string())
            .parse::<u32>()
            .context("BCRYPT_COST must be a valid number")?;

        let cookie_secure = env::var("COOKIE_SECURE")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .context("COOKIE_SECURE must be true or false")?;

        let config = AuthConfig {
            access_token_secret,
            access_token_expiry_seconds,
            refresh_token_secret,
            refresh_token_expiry_seconds,
            bcrypt_cost,
            cookie_secure,
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that would let one token kind pass as the other.
    pub fn validate(&self) -> Result<()> {
        if self.access_token_secret.is_empty() || self.refresh_token_secret.is_empty() {
            bail!("token secrets must not be empty");
        }
        if self.access_token_secret == self.refresh_token_secret {
            bail!("ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ");
        }
        for (name, seconds) in [
            ("ACCESS_TOKEN_EXPIRY_SECONDS", self.access_token_expiry_seconds),
            ("REFRESH_TOKEN_EXPIRY_SECONDS", self.refresh_token_expiry_seconds),
        ] {
            if !(1..=MAX_TOKEN_EXPIRY_SECONDS).contains(&seconds) {
                bail!("{} must be between 1 and {}", name, MAX_TOKEN_EXPIRY_SECONDS);
            }
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            bail!("BCRYPT_COST must be between 4 and 31");
        }
        Ok(())
    }
}

impl StorageConfig {
    fn from_env(server_port: u16) -> Result<Self> {
        let upload_dir = expand_path(
            &env::var("UPLOAD_DIR").unwrap_or_else(|_| "./public/temp".to_string()),
        )
        .context("UPLOAD_DIR must be a valid path")?;

        let upload_url = env::var("OBJECT_STORE_UPLOAD_URL").ok();
        let upload_api_key = env::var("OBJECT_STORE_API_KEY").ok();
        let upload_preset = env::var("OBJECT_STORE_UPLOAD_PRESET").ok();

        let upload_timeout_seconds = env::var("OBJECT_STORE_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .context("OBJECT_STORE_TIMEOUT_SECONDS must be a valid number")?;

        let media_dir = expand_path(
            &env::var("MEDIA_DIR").unwrap_or_else(|_| "./public/media".to_string()),
        )
        .context("MEDIA_DIR must be a valid path")?;

        let media_base_url = env::var("MEDIA_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}/media", server_port));

        Ok(StorageConfig {
            upload_dir,
            upload_url,
            upload_api_key,
            upload_preset,
            upload_timeout_seconds,
            media_dir,
            media_base_url,
        })
    }
}

fn expand_path(raw: &str) -> Result<PathBuf> {
    Ok(expanduser(raw)?)
}
