use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Ride lifecycle status. The sequence is strictly forward:
/// requested -> accepted -> started -> completed. There is no cancellation
/// state and no reverse transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RideStatus {
    Requested,
    Accepted,
    Started,
    Completed,
}

impl RideStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RideStatus::Requested => "requested",
            RideStatus::Accepted => "accepted",
            RideStatus::Started => "started",
            RideStatus::Completed => "completed",
        }
    }

    /// The status a ride must currently hold for a transition into `self`.
    pub fn required_prior(&self) -> Option<RideStatus> {
        match self {
            RideStatus::Requested => None,
            RideStatus::Accepted => Some(RideStatus::Requested),
            RideStatus::Started => Some(RideStatus::Accepted),
            RideStatus::Completed => Some(RideStatus::Started),
        }
    }
}

impl FromStr for RideStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requested" => Ok(RideStatus::Requested),
            "accepted" => Ok(RideStatus::Accepted),
            "started" => Ok(RideStatus::Started),
            "completed" => Ok(RideStatus::Completed),
            _ => Err(()),
        }
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Ride {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub pickup_location: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
