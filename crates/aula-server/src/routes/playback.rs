//! Playback route handlers: session issuance, watched-position checkpoints,
//! and completion.
//!
//! `play` is the single request/response boundary the client controller
//! calls; it wraps the access guard and the session issuer. `progress` and
//! `complete` feed the checkpoint store and are themselves enrollment-gated
//! so a viewer cannot accrue progress on a course they were never approved
//! for.

use axum::extract::{Extension, Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use aula_core::{Error, UserId};
use aula_db::models::Lecture;

use crate::access::{authorize_viewer, AccessDecision};
use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::auth::load_user;
use crate::session::PlaybackSessionGrant;

// ---------------------------------------------------------------------------
// Request / response schemas
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ProgressRequest {
    pub watched_seconds: i64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProgressResponse {
    pub lecture_id: String,
    pub watched_seconds: i64,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    pub updated_at: String,
}

impl ProgressResponse {
    fn from_model(p: &aula_db::models::LectureProgress) -> Self {
        Self {
            lecture_id: p.lecture_id.to_string(),
            watched_seconds: p.watched_seconds,
            completed: p.completed,
            completed_at: p.completed_at.clone(),
            updated_at: p.updated_at.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Gate a progress-mutating request: the lecture must exist and the viewer
/// must hold an approved enrollment. Evaluated fresh on every call.
fn gate(
    conn: &rusqlite::Connection,
    viewer_id: UserId,
    lecture_id: aula_core::LectureId,
) -> Result<Lecture, Error> {
    let (lecture, decision) = authorize_viewer(conn, viewer_id, lecture_id)?;
    match decision {
        AccessDecision::Allow => Ok(lecture.expect("allow implies lecture exists")),
        AccessDecision::Deny(reason) => Err(Error::denied(reason)),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/lectures/{id}/play
///
/// Request a playback session: a signed, time-limited media URL plus the
/// watermark identity payload. Denials carry a reason code so the client
/// can show "request access" instead of a generic error.
#[utoipa::path(
    post,
    path = "/api/lectures/{id}/play",
    params(("id" = String, Path, description = "Lecture ID")),
    responses(
        (status = 200, description = "Playback session granted", body = PlaybackSessionGrant),
        (status = 403, description = "Enrollment missing or pending"),
        (status = 404, description = "Lecture not found")
    )
)]
pub async fn play(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
    Path(id): Path<String>,
) -> Result<Json<PlaybackSessionGrant>, AppError> {
    let lecture_id: aula_core::LectureId = id
        .parse()
        .map_err(|_| Error::Validation("Invalid lecture ID".into()))?;

    let conn = aula_db::pool::get_conn(&ctx.db)?;
    let viewer = load_user(&conn, user_id)?;

    let grant = ctx.issuer.issue(&conn, &viewer, lecture_id)?;
    Ok(Json(grant))
}

/// POST /api/lectures/{id}/progress
///
/// Record a watched-position checkpoint. The stored value is the maximum
/// ever submitted, so duplicated or reordered deliveries cannot rewind
/// progress.
#[utoipa::path(
    post,
    path = "/api/lectures/{id}/progress",
    params(("id" = String, Path, description = "Lecture ID")),
    request_body = ProgressRequest,
    responses(
        (status = 200, description = "Merged progress", body = ProgressResponse),
        (status = 403, description = "Enrollment missing or pending"),
        (status = 404, description = "Lecture not found")
    )
)]
pub async fn update_progress(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
    Path(id): Path<String>,
    Json(body): Json<ProgressRequest>,
) -> Result<Json<ProgressResponse>, AppError> {
    let lecture_id: aula_core::LectureId = id
        .parse()
        .map_err(|_| Error::Validation("Invalid lecture ID".into()))?;

    let conn = aula_db::pool::get_conn(&ctx.db)?;
    let lecture = gate(&conn, user_id, lecture_id)?;

    let progress = aula_db::queries::progress::record_progress(
        &conn,
        user_id,
        lecture_id,
        body.watched_seconds,
        lecture.duration_secs,
    )?;

    Ok(Json(ProgressResponse::from_model(&progress)))
}

/// POST /api/lectures/{id}/complete
///
/// Explicitly mark a lecture completed once the viewer has reached the end.
/// Idempotent: a second call returns the same completion fact.
#[utoipa::path(
    post,
    path = "/api/lectures/{id}/complete",
    params(("id" = String, Path, description = "Lecture ID")),
    responses(
        (status = 200, description = "Completion fact", body = ProgressResponse),
        (status = 400, description = "Lecture duration unknown"),
        (status = 403, description = "Enrollment missing or pending")
    )
)]
pub async fn complete(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
    Path(id): Path<String>,
) -> Result<Json<ProgressResponse>, AppError> {
    let lecture_id: aula_core::LectureId = id
        .parse()
        .map_err(|_| Error::Validation("Invalid lecture ID".into()))?;

    let conn = aula_db::pool::get_conn(&ctx.db)?;
    let lecture = gate(&conn, user_id, lecture_id)?;

    let progress = aula_db::queries::progress::mark_complete(
        &conn,
        user_id,
        lecture_id,
        lecture.duration_secs,
    )?;

    Ok(Json(ProgressResponse::from_model(&progress)))
}

/// GET /api/progress
///
/// All progress rows of the caller, most recently updated first (resume
/// positions).
#[utoipa::path(
    get,
    path = "/api/progress",
    responses(
        (status = 200, description = "Caller's progress", body = Vec<ProgressResponse>)
    )
)]
pub async fn list_progress(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<Vec<ProgressResponse>>, AppError> {
    let conn = aula_db::pool::get_conn(&ctx.db)?;
    let rows = aula_db::queries::progress::list_progress_for_user(&conn, user_id)?;
    Ok(Json(rows.iter().map(ProgressResponse::from_model).collect()))
}

/// GET /api/lectures/{id}/progress
///
/// Progress of the caller on one lecture. 404 when nothing recorded yet.
#[utoipa::path(
    get,
    path = "/api/lectures/{id}/progress",
    params(("id" = String, Path, description = "Lecture ID")),
    responses(
        (status = 200, description = "Progress", body = ProgressResponse),
        (status = 404, description = "No progress recorded")
    )
)]
pub async fn get_progress(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
    Path(id): Path<String>,
) -> Result<Json<ProgressResponse>, AppError> {
    let lecture_id: aula_core::LectureId = id
        .parse()
        .map_err(|_| Error::Validation("Invalid lecture ID".into()))?;

    let conn = aula_db::pool::get_conn(&ctx.db)?;
    let progress = aula_db::queries::progress::get_progress(&conn, user_id, lecture_id)?
        .ok_or_else(|| Error::not_found("progress", lecture_id))?;
    Ok(Json(ProgressResponse::from_model(&progress)))
}
