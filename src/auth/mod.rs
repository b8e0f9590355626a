//! Token issuance and validation.
//!
//! Two HS256 token kinds share one claims shape: short-lived access tokens
//! authorize requests, longer-lived refresh tokens mint new access tokens.
//! Tokens are self-validating until expiry; logout stores a SHA-256 digest of
//! the refresh token in the `revoked_tokens` denylist, which every refresh
//! attempt checks.

pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;

#[derive(Debug, Error)]
pub enum TokenError {
    // One generic variant on purpose: callers must not learn which check failed
    #[error("invalid token")]
    Invalid,

    #[error("token generation failed: {0}")]
    Generation(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenUse {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub role: String,
    pub token_use: TokenUse,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    fn new(sub: Uuid, username: &str, role: &str, token_use: TokenUse, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub,
            username: username.to_string(),
            role: role.to_string(),
            token_use,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

fn sign(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::Generation("empty JWT secret".to_string()));
    }
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| TokenError::Generation(e.to_string()))
}

pub fn issue_access_token(
    sub: Uuid,
    username: &str,
    role: &str,
    config: &SecurityConfig,
) -> Result<String, TokenError> {
    let claims = Claims::new(
        sub,
        username,
        role,
        TokenUse::Access,
        Duration::minutes(config.access_token_ttl_mins),
    );
    sign(&claims, &config.jwt_secret)
}

pub fn issue_token_pair(
    sub: Uuid,
    username: &str,
    role: &str,
    config: &SecurityConfig,
) -> Result<TokenPair, TokenError> {
    let refresh = Claims::new(
        sub,
        username,
        role,
        TokenUse::Refresh,
        Duration::days(config.refresh_token_ttl_days),
    );
    Ok(TokenPair {
        access_token: issue_access_token(sub, username, role, config)?,
        refresh_token: sign(&refresh, &config.jwt_secret)?,
    })
}

/// Validate signature and expiry, and require the expected token kind so a
/// refresh token can never pass as an access token (or vice versa).
pub fn decode_token(token: &str, secret: &str, expected: TokenUse) -> Result<Claims, TokenError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| TokenError::Invalid)?;

    if data.claims.token_use != expected {
        return Err(TokenError::Invalid);
    }
    Ok(data.claims)
}

/// Denylist key for a refresh token. Digesting keeps raw tokens out of the
/// database.
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
