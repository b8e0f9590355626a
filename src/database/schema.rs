//! Schema definition and the one-time provisioning step.
//!
//! `provision` is run explicitly at deploy time (`swift-shuttle provision`),
//! never on server start. Both the DDL and the default-admin insert are
//! idempotent, and the admin insert relies on the `username` unique constraint
//! so concurrent provisioning runs cannot create two admins.

use chrono::Utc;
use sqlx::{Executor, PgPool};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::config::ProvisioningConfig;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Foreign-key actions carry the required semantics: deleting a ride removes
/// its tracking and attendance rows, deleting a driver nulls `rides.driver_id`.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT FALSE,
    is_staff BOOLEAN NOT NULL DEFAULT FALSE,
    is_superuser BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS rides (
    id UUID PRIMARY KEY,
    parent_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    driver_id UUID REFERENCES users(id) ON DELETE SET NULL,
    pickup_location TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'requested',
    created_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS tracking (
    id UUID PRIMARY KEY,
    ride_id UUID NOT NULL REFERENCES rides(id) ON DELETE CASCADE,
    latitude DOUBLE PRECISION NOT NULL,
    longitude DOUBLE PRECISION NOT NULL,
    timestamp TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tracking_ride_ts ON tracking(ride_id, timestamp);

CREATE TABLE IF NOT EXISTS attendance (
    id UUID PRIMARY KEY,
    ride_id UUID NOT NULL REFERENCES rides(id) ON DELETE CASCADE,
    student_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    check_in_time TIMESTAMPTZ,
    check_out_time TIMESTAMPTZ
);

CREATE INDEX IF NOT EXISTS idx_attendance_student ON attendance(student_id);

CREATE TABLE IF NOT EXISTS notifications (
    id UUID PRIMARY KEY,
    recipient_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    message TEXT NOT NULL,
    seen BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_notifications_recipient ON notifications(recipient_id, created_at);

CREATE TABLE IF NOT EXISTS revoked_tokens (
    token_digest TEXT PRIMARY KEY,
    revoked_at TIMESTAMPTZ NOT NULL
);
"#;

pub async fn provision(pool: &PgPool, config: &ProvisioningConfig) -> Result<(), ProvisionError> {
    pool.execute(SCHEMA).await?;
    tracing::info!("schema provisioned");

    let password = config
        .admin_password
        .as_deref()
        .ok_or(ProvisionError::ConfigMissing("ADMIN_PASSWORD"))?;
    let password_hash =
        hash_password(password).map_err(|e| ProvisionError::Hashing(e.to_string()))?;

    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO users
             (id, username, email, password_hash, role, is_active, is_staff, is_superuser, created_at, updated_at)
         VALUES ($1, $2, $3, $4, 'admin', TRUE, TRUE, TRUE, $5, $5)
         ON CONFLICT (username) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(&config.admin_username)
    .bind(&config.admin_email)
    .bind(&password_hash)
    .bind(now)
    .execute(pool)
    .await?;

    if result.rows_affected() == 1 {
        tracing::info!(username = %config.admin_username, "default admin created");
    } else {
        tracing::info!(username = %config.admin_username, "admin already exists, skipping");
    }
    Ok(())
}
