//! Database-backed integration tests for the storage-level invariants:
//! forced ride status, single-winner accept, refresh revocation, foreign-key
//! cascade/set-null behavior and unconditional attendance stamping.
//!
//! Each test skips itself when DATABASE_URL is not set or unreachable.

mod common;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

use common::{
    bearer_for, db_app, get, insert_user, seed_attendance, seed_ride, seed_tracking, send,
    with_json,
};
use swift_shuttle::auth::issue_token_pair;

#[tokio::test]
async fn request_ride_forces_requested_status() {
    let Some((app, pool, security)) = db_app().await else { return };
    let parent = insert_user(&pool, "parent").await;
    let auth = bearer_for(parent, "parent", &security);

    // Client tries to smuggle in a terminal status
    let (status, _) = send(
        app.clone(),
        with_json(
            "POST",
            "/rides/request_ride",
            Some(&auth),
            json!({ "pickup_location": "North Gate", "status": "completed" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(app, get("/rides/my_requests", Some(&auth))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["status"], "requested");
}

#[tokio::test]
async fn double_accept_has_one_winner_and_a_conflict() {
    let Some((app, pool, security)) = db_app().await else { return };
    let parent = insert_user(&pool, "parent").await;
    let driver_a = insert_user(&pool, "driver").await;
    let driver_b = insert_user(&pool, "driver").await;
    let ride = seed_ride(&pool, parent, None).await;
    let uri = format!("/rides/{}/accept", ride);

    let auth_a = bearer_for(driver_a, "driver", &security);
    let (status, body) = send(app.clone(), with_json("PATCH", &uri, Some(&auth_a), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Ride accepted");

    let auth_b = bearer_for(driver_b, "driver", &security);
    let (status, body) = send(app.clone(), with_json("PATCH", &uri, Some(&auth_b), json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    // The first driver keeps the ride
    let auth_parent = bearer_for(parent, "parent", &security);
    let (status, body) = send(app, get(&format!("/rides/{}", ride), Some(&auth_parent))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "accepted");
    assert_eq!(body["driver_id"], driver_a.to_string());
}

#[tokio::test]
async fn revoked_refresh_token_fails_every_attempt() {
    let Some((app, pool, security)) = db_app().await else { return };
    let user = insert_user(&pool, "parent").await;
    let pair = issue_token_pair(user, "testuser", "parent", &security).unwrap();
    let auth = bearer_for(user, "parent", &security);

    // Refresh works before logout
    let (status, body) = send(
        app.clone(),
        with_json(
            "POST",
            "/auth/refresh",
            None,
            json!({ "refresh": pair.refresh_token }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());

    let (status, _) = send(
        app.clone(),
        with_json(
            "POST",
            "/auth/logout",
            Some(&auth),
            json!({ "refresh": pair.refresh_token }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Every subsequent attempt fails, not just the first
    for _ in 0..2 {
        let (status, body) = send(
            app.clone(),
            with_json(
                "POST",
                "/auth/refresh",
                None,
                json!({ "refresh": pair.refresh_token }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid token");
    }
}

#[tokio::test]
async fn deletes_cascade_and_null_out_as_declared() {
    let Some((app, pool, security)) = db_app().await else { return };
    let parent = insert_user(&pool, "parent").await;
    let driver = insert_user(&pool, "driver").await;
    let ride = seed_ride(&pool, parent, Some(driver)).await;
    seed_tracking(&pool, ride).await;
    seed_attendance(&pool, ride, parent).await;

    // Deleting the driver nulls rides.driver_id instead of deleting the ride
    let admin = bearer_for(Uuid::new_v4(), "admin", &security);
    let (status, _) = send(
        app.clone(),
        with_json("DELETE", &format!("/users/{}", driver), Some(&admin), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let driver_id = sqlx::query_scalar::<_, Option<Uuid>>(
        "SELECT driver_id FROM rides WHERE id = $1",
    )
    .bind(ride)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(driver_id, None);

    // Deleting the ride removes its tracking and attendance rows
    let auth = bearer_for(parent, "parent", &security);
    let (status, _) = send(
        app,
        with_json("DELETE", &format!("/rides/{}", ride), Some(&auth), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    for table in ["tracking", "attendance"] {
        let count = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM {} WHERE ride_id = $1",
            table
        ))
        .bind(ride)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 0, "{} rows survived ride deletion", table);
    }
}

#[tokio::test]
async fn check_in_overwrites_and_check_out_stamps() {
    let Some((app, pool, security)) = db_app().await else { return };
    let parent = insert_user(&pool, "parent").await;
    let ride = seed_ride(&pool, parent, None).await;
    let record = seed_attendance(&pool, ride, parent).await;
    let auth = bearer_for(parent, "parent", &security);

    let check_in_uri = format!("/attendance/{}/check_in", record);
    let (status, _) = send(
        app.clone(),
        with_json("POST", &check_in_uri, Some(&auth), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let first = fetch_stamp(&pool, record, "check_in_time").await.unwrap();

    // Second check-in silently replaces the first timestamp
    tokio::time::sleep(Duration::from_millis(20)).await;
    let (status, _) = send(
        app.clone(),
        with_json("POST", &check_in_uri, Some(&auth), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let second = fetch_stamp(&pool, record, "check_in_time").await.unwrap();
    assert!(second > first);

    let (status, _) = send(
        app,
        with_json(
            "POST",
            &format!("/attendance/{}/check_out", record),
            Some(&auth),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let out = fetch_stamp(&pool, record, "check_out_time").await.unwrap();
    assert!(second <= Utc::now());
    assert!(out >= second);
}

async fn fetch_stamp(
    pool: &sqlx::PgPool,
    record: Uuid,
    column: &str,
) -> Option<DateTime<Utc>> {
    sqlx::query_scalar::<_, Option<DateTime<Utc>>>(&format!(
        "SELECT {} FROM attendance WHERE id = $1",
        column
    ))
    .bind(record)
    .fetch_one(pool)
    .await
    .unwrap()
}
