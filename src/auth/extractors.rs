use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;

use super::{
    claims::Claims,
    cookie::{cookie_value, SESSION_COOKIE},
    password::constant_time_eq,
};
use crate::{error::AppError, state::AppState};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Session token from the `token` cookie, else from `Authorization: Bearer`.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    if let Some(token) = cookie_value(headers, SESSION_COOKIE).filter(|t| !t.is_empty()) {
        return Some(token);
    }
    let auth = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = auth.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// True when the request carries the configured service key.
pub fn has_service_key(headers: &HeaderMap, expected: &str) -> bool {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|key| constant_time_eq(key.as_bytes(), expected.as_bytes()))
}

/// Verified session claims of the caller.
pub struct AuthUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("missing token".into()))?;

        let claims = state.keys.verify(token).map_err(|e| {
            debug!(reason = %e, "token rejected");
            AppError::from(e)
        })?;
        Ok(AuthUser(claims))
    }
}

/// A caller whose session belongs to the configured administrative account.
pub struct AdminUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        if claims.email != state.config.admin_email {
            debug!(email = %claims.email, "admin route refused");
            return Err(AppError::Forbidden("admin privileges required".into()));
        }
        Ok(AdminUser(claims))
    }
}

/// A trusted backend presenting the pre-shared service key.
pub struct ServiceCaller;

#[async_trait]
impl FromRequestParts<AppState> for ServiceCaller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if has_service_key(&parts.headers, &state.config.service_api_key) {
            Ok(ServiceCaller)
        } else {
            Err(AppError::Unauthorized("invalid service key".into()))
        }
    }
}
