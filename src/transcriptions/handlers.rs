use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::OkResponse,
        extractors::{AuthUser, ServiceCaller},
        jwt::now_unix,
    },
    error::{required, AppError, AppResult},
    state::AppState,
    transcriptions::{
        dto::{
            AddTranscriptionRequest, DeleteTranscriptionRequest, RenameTranscriptionRequest,
            TranscriptionListResponse,
        },
        repo_types::{AddOutcome, Transcription},
    },
};

// --- public routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/transcriptions", get(list_transcriptions))
        .route("/transcriptions/", get(list_transcriptions))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/transcriptions/add", post(add_transcription))
        .route("/transcriptions/rename", put(rename_transcription))
        .route("/transcriptions/delete", delete(delete_transcription))
}

fn not_found() -> AppError {
    AppError::NotFound("transcription not found".into())
}

// --- handlers ---

/// Service-to-service: records a finished job and charges its owner.
#[instrument(skip_all)]
pub async fn add_transcription(
    State(state): State<AppState>,
    _service: ServiceCaller,
    Json(body): Json<AddTranscriptionRequest>,
) -> AppResult<(StatusCode, Json<OkResponse>)> {
    let email = required(body.email, "email")?;
    let job_id = required(body.jobid, "jobid")?;
    let filename = required(body.filename, "filename")?;

    match Transcription::add_and_charge(&state.db, &job_id, &email, &filename, now_unix()).await? {
        AddOutcome::Added(_) => {
            info!(%job_id, %email, "transcription recorded");
            Ok((StatusCode::CREATED, Json(OkResponse::ok())))
        }
        AddOutcome::DuplicateJob => Err(AppError::Conflict("jobid already exists".into())),
        AddOutcome::UnknownOwner => Err(AppError::NotFound("account not found".into())),
    }
}

#[instrument(skip_all)]
pub async fn list_transcriptions(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> AppResult<Json<TranscriptionListResponse>> {
    let rows = Transcription::list_by_owner(&state.db, &claims.email).await?;
    Ok(Json(TranscriptionListResponse {
        email: claims.email,
        transcriptions: rows.into_iter().map(Into::into).collect(),
    }))
}

/// Someone else's job answers 404, same as a missing one.
#[instrument(skip_all)]
pub async fn rename_transcription(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(body): Json<RenameTranscriptionRequest>,
) -> AppResult<Json<OkResponse>> {
    let job_id = required(body.jobid, "jobid")?;
    let filename = required(body.filename, "filename")?;

    if !Transcription::rename_owned(&state.db, &job_id, &claims.email, &filename).await? {
        return Err(not_found());
    }
    info!(%job_id, email = %claims.email, "transcription renamed");
    Ok(Json(OkResponse::ok()))
}

#[instrument(skip_all)]
pub async fn delete_transcription(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(body): Json<DeleteTranscriptionRequest>,
) -> AppResult<Json<OkResponse>> {
    let job_id = required(body.jobid, "jobid")?;

    if !Transcription::delete_owned(&state.db, &job_id, &claims.email).await? {
        return Err(not_found());
    }
    info!(%job_id, email = %claims.email, "transcription deleted");
    Ok(Json(OkResponse::ok()))
}
