use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        cookie::{clear_session_cookie, session_cookie},
        dto::{CredentialsRequest, IncrementResponse, MeResponse, OkResponse, UsageListResponse},
        extractors::{AdminUser, AuthUser},
        repo_types::{Account, AccountUsage},
        services::{authenticate, register},
    },
    error::{required, AppError, AppResult},
    state::AppState,
};

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_account))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(get_me))
}

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/increment", post(increment))
        .route("/usage", get(all_usage))
        .route("/myusage", get(my_usage))
}

fn cookie_headers(state: &AppState, token: &str) -> AppResult<HeaderMap> {
    let value = session_cookie(token, state.config.cookie_secure, state.keys.lifetime_secs())
        .map_err(|e| AppError::Internal(anyhow::Error::new(e).context("session cookie")))?;
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, value);
    Ok(headers)
}

#[instrument(skip(state, payload))]
pub async fn create_account(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> AppResult<(StatusCode, HeaderMap, Json<OkResponse>)> {
    let email = required(payload.email, "email")?;
    let password = required(payload.password, "password")?;

    let token = register(&state, &email, &password).await?;
    Ok((
        StatusCode::CREATED,
        cookie_headers(&state, &token)?,
        Json(OkResponse::ok()),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> AppResult<(HeaderMap, Json<OkResponse>)> {
    let email = required(payload.email, "email")?;
    let password = required(payload.password, "password")?;

    let token = authenticate(&state, &email, &password).await?;
    Ok((cookie_headers(&state, &token)?, Json(OkResponse::ok())))
}

/// Clears the cookie. Tokens already handed out stay valid until they expire.
#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> (HeaderMap, Json<OkResponse>) {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        clear_session_cookie(state.config.cookie_secure),
    );
    (headers, Json(OkResponse::ok()))
}

#[instrument(skip_all)]
pub async fn get_me(AuthUser(claims): AuthUser) -> Json<MeResponse> {
    Json(MeResponse { payload: claims })
}

#[instrument(skip_all)]
pub async fn increment(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> AppResult<Json<IncrementResponse>> {
    let usage = Account::increment_usage(&state.db, &claims.email)
        .await?
        .ok_or_else(|| AppError::NotFound("account not found".into()))?;
    info!(email = %claims.email, usage, "usage incremented");
    Ok(Json(IncrementResponse { ok: true, usage }))
}

#[instrument(skip_all)]
pub async fn all_usage(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<UsageListResponse>> {
    let users = Account::list_usage(&state.db).await?;
    Ok(Json(UsageListResponse { users }))
}

#[instrument(skip_all)]
pub async fn my_usage(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> AppResult<Json<AccountUsage>> {
    Account::usage_of(&state.db, &claims.email)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("account not found".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn me_response_wraps_claims() {
        let mut claims = crate::auth::claims::Claims::for_subject("test@example.com");
        claims.iat = Some(10);
        claims.exp = Some(20);
        let json = serde_json::to_value(MeResponse { payload: claims }).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"payload": {"email": "test@example.com", "iat": 10, "exp": 20}})
        );
    }
}
