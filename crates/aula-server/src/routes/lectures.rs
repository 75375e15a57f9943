//! Lecture catalog route handlers.

use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use aula_core::UserId;

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::auth::require_admin;

// ---------------------------------------------------------------------------
// Request / response schemas
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateLectureRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Video file path relative to the media storage dir; empty = no video yet.
    #[serde(default)]
    pub media_path: String,
    /// Duration in seconds; 0 = unknown.
    #[serde(default)]
    pub duration_secs: i64,
    #[serde(default)]
    pub order_index: i64,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SetMediaRequest {
    pub media_path: String,
    pub duration_secs: i64,
}

/// Lecture as exposed to clients. Deliberately omits `media_path`: the only
/// route to the bytes is a signed playback session.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LectureResponse {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub description: String,
    pub duration_secs: i64,
    pub order_index: i64,
    pub has_video: bool,
    pub created_at: String,
}

impl LectureResponse {
    pub(crate) fn from_model(l: &aula_db::models::Lecture) -> Self {
        Self {
            id: l.id.to_string(),
            course_id: l.course_id.to_string(),
            title: l.title.clone(),
            description: l.description.clone(),
            duration_secs: l.duration_secs,
            order_index: l.order_index,
            has_video: !l.media_path.is_empty(),
            created_at: l.created_at.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/lectures/{id}
#[utoipa::path(
    get,
    path = "/api/lectures/{id}",
    params(("id" = String, Path, description = "Lecture ID")),
    responses(
        (status = 200, description = "Lecture", body = LectureResponse),
        (status = 404, description = "Lecture not found")
    )
)]
pub async fn get_lecture(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<LectureResponse>, AppError> {
    let lecture_id: aula_core::LectureId = id
        .parse()
        .map_err(|_| aula_core::Error::Validation("Invalid lecture ID".into()))?;

    let conn = aula_db::pool::get_conn(&ctx.db)?;
    let lecture = aula_db::queries::lectures::get_lecture(&conn, lecture_id)?
        .ok_or_else(|| aula_core::Error::not_found("lecture", lecture_id))?;

    Ok(Json(LectureResponse::from_model(&lecture)))
}

/// POST /api/courses/{id}/lectures (admin)
#[utoipa::path(
    post,
    path = "/api/courses/{id}/lectures",
    params(("id" = String, Path, description = "Course ID")),
    request_body = CreateLectureRequest,
    responses(
        (status = 201, description = "Lecture created", body = LectureResponse),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Course not found")
    )
)]
pub async fn create_lecture(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
    Path(id): Path<String>,
    Json(body): Json<CreateLectureRequest>,
) -> Result<(StatusCode, Json<LectureResponse>), AppError> {
    let course_id: aula_core::CourseId = id
        .parse()
        .map_err(|_| aula_core::Error::Validation("Invalid course ID".into()))?;

    let conn = aula_db::pool::get_conn(&ctx.db)?;
    require_admin(&conn, user_id)?;

    if body.title.trim().is_empty() {
        return Err(aula_core::Error::Validation("title is required".into()).into());
    }
    if body.duration_secs < 0 {
        return Err(aula_core::Error::Validation("duration_secs must be >= 0".into()).into());
    }

    aula_db::queries::courses::get_course(&conn, course_id)?
        .ok_or_else(|| aula_core::Error::not_found("course", course_id))?;

    let lecture = aula_db::queries::lectures::create_lecture(
        &conn,
        course_id,
        body.title.trim(),
        &body.description,
        &body.media_path,
        body.duration_secs,
        body.order_index,
    )?;

    Ok((StatusCode::CREATED, Json(LectureResponse::from_model(&lecture))))
}

/// PUT /api/lectures/{id}/media (admin)
///
/// Attach or replace the video file reference of a lecture.
#[utoipa::path(
    put,
    path = "/api/lectures/{id}/media",
    params(("id" = String, Path, description = "Lecture ID")),
    request_body = SetMediaRequest,
    responses(
        (status = 200, description = "Media updated", body = LectureResponse),
        (status = 404, description = "Lecture not found")
    )
)]
pub async fn set_lecture_media(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
    Path(id): Path<String>,
    Json(body): Json<SetMediaRequest>,
) -> Result<Json<LectureResponse>, AppError> {
    let lecture_id: aula_core::LectureId = id
        .parse()
        .map_err(|_| aula_core::Error::Validation("Invalid lecture ID".into()))?;

    let conn = aula_db::pool::get_conn(&ctx.db)?;
    require_admin(&conn, user_id)?;

    if body.duration_secs < 0 {
        return Err(aula_core::Error::Validation("duration_secs must be >= 0".into()).into());
    }

    if !aula_db::queries::lectures::set_lecture_media(
        &conn,
        lecture_id,
        &body.media_path,
        body.duration_secs,
    )? {
        return Err(aula_core::Error::not_found("lecture", lecture_id).into());
    }

    let lecture = aula_db::queries::lectures::get_lecture(&conn, lecture_id)?
        .ok_or_else(|| aula_core::Error::not_found("lecture", lecture_id))?;
    Ok(Json(LectureResponse::from_model(&lecture)))
}

/// DELETE /api/lectures/{id} (admin)
#[utoipa::path(
    delete,
    path = "/api/lectures/{id}",
    params(("id" = String, Path, description = "Lecture ID")),
    responses(
        (status = 200, description = "Lecture deleted"),
        (status = 404, description = "Lecture not found")
    )
)]
pub async fn delete_lecture(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let lecture_id: aula_core::LectureId = id
        .parse()
        .map_err(|_| aula_core::Error::Validation("Invalid lecture ID".into()))?;

    let conn = aula_db::pool::get_conn(&ctx.db)?;
    require_admin(&conn, user_id)?;

    if !aula_db::queries::lectures::delete_lecture(&conn, lecture_id)? {
        return Err(aula_core::Error::not_found("lecture", lecture_id).into());
    }
    Ok(StatusCode::OK)
}
