use crate::state::AppState;
use axum::Router;

pub mod claims;
pub mod codec;
pub mod cookie;
pub mod csrf;
pub(crate) mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::session_routes())
        .merge(handlers::account_routes())
}
