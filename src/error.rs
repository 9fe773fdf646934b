use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::auth::{jwt::TokenError, password::HashError};

pub type AppResult<T> = Result<T, AppError>;

/// Every failure a handler can return, mapped onto an HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub error: &'static str,
    pub message: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal",
        }
    }
}

/// Unwraps a request field, treating absent or blank values as a bad request.
pub fn required(value: Option<String>, field: &str) -> AppResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::BadRequest(format!("{field} is required"))),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Internal(e) => {
                error!(error = ?e, "internal error");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorBody {
            ok: false,
            error: self.code(),
            message,
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        Self::Internal(anyhow::Error::new(e).context("database"))
    }
}

impl From<HashError> for AppError {
    fn from(e: HashError) -> Self {
        Self::Internal(anyhow::Error::new(e).context("password derivation"))
    }
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        if e.is_rejection() {
            Self::Unauthorized(e.to_string())
        } else {
            Self::Internal(anyhow::Error::new(e).context("token issuance"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn internal_errors_hide_their_cause() {
        let resp = AppError::Internal(anyhow::anyhow!("argon2 exploded")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "internal");
        assert_eq!(json["message"], "internal server error");
        assert!(!String::from_utf8_lossy(&body).contains("argon2"));
    }

    #[test]
    fn token_rejections_map_to_unauthorized() {
        assert_eq!(AppError::from(TokenError::Expired).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::from(TokenError::Malformed("x")).status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn derivation_failures_surface_as_internal_with_cause() {
        let hasher = crate::auth::password::CredentialHasher::new(64, 1, 1).unwrap();
        let err = AppError::from(hasher.derive("pw", b"abc").unwrap_err());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let AppError::Internal(cause) = err else {
            panic!("expected internal error");
        };
        assert!(format!("{cause:?}").contains("key derivation failed"));
    }

    #[test]
    fn blank_fields_are_bad_requests() {
        assert_eq!(required(Some("x".into()), "email").unwrap(), "x");
        let err = required(Some("  ".into()), "email").unwrap_err();
        assert_eq!(err.to_string(), "email is required");
        assert!(matches!(required(None, "jobid"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn statuses_follow_taxonomy() {
        assert_eq!(AppError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
    }
}
