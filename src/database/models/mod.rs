pub mod attendance;
pub mod notification;
pub mod ride;
pub mod tracking;
pub mod user;

pub use attendance::AttendanceRecord;
pub use notification::Notification;
pub use ride::{Ride, RideStatus};
pub use tracking::TrackingPoint;
pub use user::{Role, User};
