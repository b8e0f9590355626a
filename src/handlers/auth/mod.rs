//! Authentication endpoints: registration, token issuance and rotation,
//! logout (refresh revocation) and the caller's own profile.

pub mod login;
pub mod logout;
pub mod profile;
pub mod refresh;
pub mod register;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::middleware::jwt_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    let open = Router::new()
        .route("/auth/register", post(register::register))
        .route("/auth/login", post(login::login))
        .route("/auth/refresh", post(refresh::refresh));

    let protected = Router::new()
        .route("/auth/logout", post(logout::logout))
        .route(
            "/auth/profile",
            get(profile::profile).patch(profile::profile_update),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth));

    open.merge(protected).with_state(state)
}
