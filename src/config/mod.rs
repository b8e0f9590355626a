use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),

    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub provisioning: ProvisioningConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub access_token_ttl_mins: i64,
    pub refresh_token_ttl_days: i64,
}

/// Credentials for the one-time `provision` step. Never read by `serve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningConfig {
    pub admin_username: String,
    pub admin_email: String,
    pub admin_password: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            _ => Environment::Development,
        };

        let url = env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            // A fixed fallback is acceptable only outside production
            _ if environment == Environment::Development => "dev-secret-change-me".to_string(),
            _ => return Err(ConfigError::Missing("JWT_SECRET")),
        };

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid("PORT", raw))?,
            Err(_) => 3000,
        };

        Ok(Self {
            environment,
            server: ServerConfig { port },
            database: DatabaseConfig {
                url,
                max_connections: parse_or("DB_MAX_CONNECTIONS", 10)?,
            },
            security: SecurityConfig {
                jwt_secret,
                access_token_ttl_mins: parse_or("ACCESS_TOKEN_TTL_MINS", 60)?,
                refresh_token_ttl_days: parse_or("REFRESH_TOKEN_TTL_DAYS", 7)?,
            },
            provisioning: ProvisioningConfig {
                admin_username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
                admin_email: env::var("ADMIN_EMAIL")
                    .unwrap_or_else(|_| "admin@example.com".to_string()),
                admin_password: env::var("ADMIN_PASSWORD").ok(),
            },
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.parse::<T>().map_err(|_| ConfigError::Invalid(key, raw)),
        Err(_) => Ok(default),
    }
}
