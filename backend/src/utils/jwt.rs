//! JWT token utilities for authentication and session renewal.
//!
//! Issues two kinds of signed, time-limited tokens. Access tokens are short
//! lived and authorize requests; refresh tokens live longer and are only
//! good for minting a new pair. Each kind has its own secret, so one can
//! never be verified as the other.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::errors::{ServiceError, ServiceResult, TokenError};

/// JWT Claims structure carried by both token kinds
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Unique token id, so two tokens issued in the same second differ
    pub jti: String,
    /// Token expiration timestamp
    pub exp: usize,
    /// Token issued at timestamp
    pub iat: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Freshly issued access and refresh tokens.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

struct TokenKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expires_in_seconds: u64,
}

impl TokenKeys {
    fn new(secret: &str, expires_in_seconds: u64) -> Self {
        TokenKeys {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expires_in_seconds,
        }
    }
}

/// Stateless signer/verifier for access and refresh tokens
pub struct TokenService {
    access: TokenKeys,
    refresh: TokenKeys,
    validation: Validation,
}

impl TokenService {
    /// Create a new TokenService from the auth settings
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        TokenService {
            access: TokenKeys::new(&config.access_token_secret, config.access_token_expiry_seconds),
            refresh: TokenKeys::new(
                &config.refresh_token_secret,
                config.refresh_token_expiry_seconds,
            ),
            validation,
        }
    }

    fn keys(&self, kind: TokenKind) -> &TokenKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Lifetime in seconds of tokens of the given kind.
    pub fn expires_in(&self, kind: TokenKind) -> u64 {
        self.keys(kind).expires_in_seconds
    }

    /// Sign a token of the given kind for a user
    pub fn issue(&self, kind: TokenKind, user_id: &str) -> ServiceResult<String> {
        let keys = self.keys(kind);
        let now = Utc::now();
        let exp = i64::try_from(keys.expires_in_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                ServiceError::internal_error(format!(
                    "Token lifetime of {}s is out of range",
                    keys.expires_in_seconds
                ))
            })?;

        let claims = Claims {
            sub: user_id.to_string(),
            jti: Uuid::now_v7().to_string(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(&Header::default(), &claims, &keys.encoding_key)
            .map_err(|e| ServiceError::internal_error(format!("Token generation failed: {}", e)))
    }

    pub fn issue_access_token(&self, user_id: &str) -> ServiceResult<String> {
        self.issue(TokenKind::Access, user_id)
    }

    pub fn issue_refresh_token(&self, user_id: &str) -> ServiceResult<String> {
        self.issue(TokenKind::Refresh, user_id)
    }

    /// Issue an access token and a refresh token together
    pub fn issue_pair(&self, user_id: &str) -> ServiceResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue_access_token(user_id)?,
            refresh_token: self.issue_refresh_token(user_id)?,
        })
    }

    /// Validate and decode a token of the given kind
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.keys(kind).decoding_key, &self.validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| {
                debug!("{:?} token rejected: {}", kind, e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Invalid,
                }
            })
    }
}

impl Claims {
    pub fn user_id(&self) -> &str {
        &self.sub
    }
}
