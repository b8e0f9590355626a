use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One GPS sample in a ride's append-only position log.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TrackingPoint {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}
