use sqlx::PgPool;
use std::sync::Arc;

use crate::config::AppConfig;

/// Shared application state handed to every handler through axum's `State`
/// extractor. Request-scoped identity travels separately as an `AuthUser`
/// extension; nothing is looked up through globals.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig) -> Self {
        Self {
            pool,
            config: Arc::new(config),
        }
    }
}
