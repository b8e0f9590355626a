pub mod auth;
pub mod response;

pub use auth::{jwt_auth, require_admin, AuthUser};
pub use response::{created, message, MessageResponse};
