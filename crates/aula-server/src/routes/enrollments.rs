//! Enrollment route handlers: request (student) and approve/list (admin).

use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use aula_core::UserId;

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::auth::require_admin;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct EnrollmentResponse {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub status: String,
    pub requested_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<String>,
}

impl EnrollmentResponse {
    fn from_model(e: &aula_db::models::Enrollment) -> Self {
        Self {
            id: e.id.to_string(),
            user_id: e.user_id.to_string(),
            course_id: e.course_id.to_string(),
            status: e.status.as_str().to_string(),
            requested_at: e.requested_at.clone(),
            decided_at: e.decided_at.clone(),
        }
    }
}

/// POST /api/courses/{id}/enroll
///
/// Request enrollment into a course. Idempotent: repeating the request
/// returns the existing enrollment instead of creating a duplicate.
#[utoipa::path(
    post,
    path = "/api/courses/{id}/enroll",
    params(("id" = String, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Enrollment state", body = EnrollmentResponse),
        (status = 404, description = "Course not found")
    )
)]
pub async fn enroll(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
    Path(id): Path<String>,
) -> Result<Json<EnrollmentResponse>, AppError> {
    let course_id: aula_core::CourseId = id
        .parse()
        .map_err(|_| aula_core::Error::Validation("Invalid course ID".into()))?;

    let conn = aula_db::pool::get_conn(&ctx.db)?;
    aula_db::queries::courses::get_course(&conn, course_id)?
        .ok_or_else(|| aula_core::Error::not_found("course", course_id))?;

    let enrollment = aula_db::queries::enrollments::request_enrollment(&conn, user_id, course_id)?;

    tracing::info!(
        user = %user_id,
        course = %course_id,
        status = enrollment.status.as_str(),
        "Enrollment requested"
    );

    Ok(Json(EnrollmentResponse::from_model(&enrollment)))
}

/// GET /api/enrollments (admin)
///
/// All enrollments, pending first.
#[utoipa::path(
    get,
    path = "/api/enrollments",
    responses(
        (status = 200, description = "All enrollments", body = Vec<EnrollmentResponse>),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_enrollments(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<Vec<EnrollmentResponse>>, AppError> {
    let conn = aula_db::pool::get_conn(&ctx.db)?;
    require_admin(&conn, user_id)?;

    let enrollments = aula_db::queries::enrollments::list_enrollments(&conn)?;
    Ok(Json(
        enrollments.iter().map(EnrollmentResponse::from_model).collect(),
    ))
}

/// GET /api/enrollments/mine
///
/// The caller's own enrollments.
#[utoipa::path(
    get,
    path = "/api/enrollments/mine",
    responses(
        (status = 200, description = "Caller's enrollments", body = Vec<EnrollmentResponse>)
    )
)]
pub async fn my_enrollments(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<Vec<EnrollmentResponse>>, AppError> {
    let conn = aula_db::pool::get_conn(&ctx.db)?;
    let enrollments = aula_db::queries::enrollments::list_enrollments_for_user(&conn, user_id)?;
    Ok(Json(
        enrollments.iter().map(EnrollmentResponse::from_model).collect(),
    ))
}

/// POST /api/enrollments/{id}/approve (admin)
#[utoipa::path(
    post,
    path = "/api/enrollments/{id}/approve",
    params(("id" = String, Path, description = "Enrollment ID")),
    responses(
        (status = 200, description = "Enrollment approved", body = EnrollmentResponse),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Enrollment not found")
    )
)]
pub async fn approve_enrollment(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<EnrollmentResponse>), AppError> {
    let enrollment_id: aula_core::EnrollmentId = id
        .parse()
        .map_err(|_| aula_core::Error::Validation("Invalid enrollment ID".into()))?;

    let conn = aula_db::pool::get_conn(&ctx.db)?;
    require_admin(&conn, user_id)?;

    let enrollment = aula_db::queries::enrollments::approve_enrollment(&conn, enrollment_id)?
        .ok_or_else(|| aula_core::Error::not_found("enrollment", enrollment_id))?;

    tracing::info!(enrollment = %enrollment_id, "Enrollment approved");

    Ok((StatusCode::OK, Json(EnrollmentResponse::from_model(&enrollment))))
}
