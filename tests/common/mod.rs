//! Shared helpers for the integration suites.
//!
//! `lazy_app` builds the router over a lazily-connected pool, for tests whose
//! requests resolve before any database work. `db_app` connects to a real
//! database and provisions the schema; suites using it skip themselves when
//! DATABASE_URL is absent or unreachable.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use uuid::Uuid;

use swift_shuttle::auth::issue_access_token;
use swift_shuttle::config::{
    AppConfig, DatabaseConfig, Environment, ProvisioningConfig, SecurityConfig, ServerConfig,
};
use swift_shuttle::database::schema::SCHEMA;
use swift_shuttle::handlers::router;
use swift_shuttle::state::AppState;

pub fn test_config(database_url: &str) -> AppConfig {
    AppConfig {
        environment: Environment::Development,
        server: ServerConfig { port: 0 },
        database: DatabaseConfig {
            url: database_url.to_string(),
            max_connections: 2,
        },
        security: SecurityConfig {
            jwt_secret: "integration-test-secret".to_string(),
            access_token_ttl_mins: 60,
            refresh_token_ttl_days: 7,
        },
        provisioning: ProvisioningConfig {
            admin_username: "admin".to_string(),
            admin_email: "admin@example.com".to_string(),
            admin_password: None,
        },
    }
}

pub fn lazy_app() -> (Router, SecurityConfig) {
    let config = test_config("postgres://postgres@localhost/swift_shuttle_test");
    let security = config.security.clone();
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy(&config.database.url)
        .expect("lazy pool");
    (router(AppState::new(pool, config)), security)
}

/// Router over a live database, or `None` (test skips) when no database is
/// available. Schema provisioning is serialized behind an advisory lock so
/// parallel tests cannot race the idempotent DDL.
pub async fn db_app() -> Option<(Router, PgPool, SecurityConfig)> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = match PgPoolOptions::new().max_connections(2).connect(&url).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("skipping database test: {}", e);
            return None;
        }
    };

    let mut conn = match pool.acquire().await {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("skipping database test: {}", e);
            return None;
        }
    };
    if let Err(e) = async {
        conn.execute("SELECT pg_advisory_lock(727427)").await?;
        let provisioned = conn.execute(SCHEMA).await;
        conn.execute("SELECT pg_advisory_unlock(727427)").await?;
        provisioned.map(|_| ())
    }
    .await
    {
        eprintln!("skipping database test: {}", e);
        return None;
    }
    drop(conn);

    let config = test_config(&url);
    let security = config.security.clone();
    Some((router(AppState::new(pool.clone(), config)), pool, security))
}

pub fn bearer_for(id: Uuid, role: &str, security: &SecurityConfig) -> String {
    let token = issue_access_token(id, "testuser", role, security).unwrap();
    format!("Bearer {}", token)
}

/// Insert an active user with a unique username, bypassing registration.
pub async fn insert_user(pool: &PgPool, role: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO users
             (id, username, email, password_hash, role, is_active, is_staff, is_superuser, created_at, updated_at)
         VALUES ($1, $2, $3, 'unusable', $4, TRUE, FALSE, FALSE, $5, $5)",
    )
    .bind(id)
    .bind(format!("user-{}", id.simple()))
    .bind(format!("{}@example.com", id.simple()))
    .bind(role)
    .bind(Utc::now())
    .execute(pool)
    .await
    .expect("insert user");
    id
}

pub async fn seed_ride(pool: &PgPool, parent: Uuid, driver: Option<Uuid>) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO rides (id, parent_id, driver_id, pickup_location, status, created_at)
         VALUES ($1, $2, $3, 'Depot', 'requested', $4)",
    )
    .bind(id)
    .bind(parent)
    .bind(driver)
    .bind(Utc::now())
    .execute(pool)
    .await
    .expect("insert ride");
    id
}

pub async fn seed_tracking(pool: &PgPool, ride: Uuid) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO tracking (id, ride_id, latitude, longitude, timestamp)
         VALUES ($1, $2, 6.5244, 3.3792, $3)",
    )
    .bind(id)
    .bind(ride)
    .bind(Utc::now())
    .execute(pool)
    .await
    .expect("insert tracking");
    id
}

pub async fn seed_attendance(pool: &PgPool, ride: Uuid, student: Uuid) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO attendance (id, ride_id, student_id, check_in_time, check_out_time)
         VALUES ($1, $2, $3, NULL, NULL)",
    )
    .bind(id)
    .bind(ride)
    .bind(student)
    .execute(pool)
    .await
    .expect("insert attendance");
    id
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    use tower::ServiceExt;

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

pub fn get(uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(value) = auth {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn with_json(method: &str, uri: &str, auth: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(value) = auth {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}
