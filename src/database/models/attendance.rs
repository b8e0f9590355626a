use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Per-ride, per-student check-in/check-out pair. Both timestamps start null
/// and are stamped (and re-stamped) by the check-in/check-out endpoints.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub student_id: Uuid,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
}
