use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;
use uuid::Uuid;

use crate::{
    auth::{
        claims::{Claims, Role},
        jwt::JwtKeys,
    },
    error::AppError,
};

/// Verified claims stored in request extensions by the route gate.
#[derive(Debug, Clone)]
pub struct Session(pub Claims);

/// Reads the session token from `Authorization: Bearer` or the session cookie.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .map(|t| t.trim().to_string());
    if bearer.is_some() {
        return bearer;
    }
    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// Identity of the caller, taken from a verified session token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl From<&Claims> for AuthUser {
    fn from(c: &Claims) -> Self {
        Self {
            user_id: c.sub,
            role: c.role,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(Session(claims)) = parts.extensions.get::<Session>() {
            return Ok(AuthUser::from(claims));
        }

        let keys = JwtKeys::from_ref(state);
        let token = session_token(&parts.headers, &keys.cookie_name)
            .ok_or_else(|| AppError::unauthorized("Unauthorized"))?;

        let claims = keys.verify_access(&token).map_err(|e| {
            warn!(error = %e, "rejected session token");
            AppError::unauthorized("Invalid or expired token")
        })?;

        Ok(AuthUser::from(&claims))
    }
}
