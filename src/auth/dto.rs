use serde::{Deserialize, Serialize};

use crate::auth::{claims::Claims, repo_types::AccountUsage};

/// Request body for `/create` and `/login`.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub payload: Claims,
}

#[derive(Debug, Serialize)]
pub struct IncrementResponse {
    pub ok: bool,
    pub usage: i64,
}

#[derive(Debug, Serialize)]
pub struct UsageListResponse {
    pub users: Vec<AccountUsage>,
}
