use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
    Extension,
};
use std::str::FromStr;
use uuid::Uuid;

use crate::auth::{decode_token, TokenUse};
use crate::database::models::Role;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller, extracted from the access token and injected into the
/// request as an extension.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

/// Validates the bearer access token and injects [`AuthUser`].
pub async fn jwt_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers())?;
    let claims = decode_token(&token, &state.config.security.jwt_secret, TokenUse::Access)
        .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

    // A role claim outside the enum means the token was not minted by us
    let role = Role::from_str(&claims.role)
        .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

    request.extensions_mut().insert(AuthUser {
        id: claims.sub,
        username: claims.username,
        role,
    });
    Ok(next.run(request).await)
}

/// Role gate layered inside [`jwt_auth`]; non-admin callers get a 403
/// regardless of the target resource.
pub async fn require_admin(
    Extension(user): Extension<AuthUser>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if user.role != Role::Admin {
        return Err(ApiError::forbidden("Admin access required"));
    }
    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header"))?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(ApiError::unauthorized(
            "Authorization header must use Bearer token format",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn missing_header_is_rejected() {
        assert!(extract_bearer_token(&HeaderMap::new()).is_err());
    }

    #[test]
    fn non_bearer_scheme_is_rejected() {
        assert!(extract_bearer_token(&headers_with("Basic dXNlcjpwdw==")).is_err());
    }

    #[test]
    fn empty_token_is_rejected() {
        assert!(extract_bearer_token(&headers_with("Bearer ")).is_err());
    }

    #[test]
    fn bearer_token_is_extracted() {
        let token = extract_bearer_token(&headers_with("Bearer abc.def.ghi")).unwrap();
        assert_eq!(token, "abc.def.ghi");
    }
}
