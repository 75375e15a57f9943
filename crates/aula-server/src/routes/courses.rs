//! Course catalog route handlers.

use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use aula_core::UserId;

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::auth::require_admin;
use crate::routes::lectures::LectureResponse;

// ---------------------------------------------------------------------------
// Request / response schemas
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateCourseRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "beginner".into()
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CourseResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub level: String,
    pub created_at: String,
}

impl CourseResponse {
    pub(crate) fn from_model(c: &aula_db::models::Course) -> Self {
        Self {
            id: c.id.to_string(),
            title: c.title.clone(),
            description: c.description.clone(),
            level: c.level.clone(),
            created_at: c.created_at.clone(),
        }
    }
}

/// Course detail: the course, its lectures, and the caller's enrollment
/// status (`null` when not enrolled).
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CourseDetailResponse {
    pub course: CourseResponse,
    pub lectures: Vec<LectureResponse>,
    pub enrollment_status: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/courses
#[utoipa::path(
    get,
    path = "/api/courses",
    responses(
        (status = 200, description = "All courses", body = Vec<CourseResponse>)
    )
)]
pub async fn list_courses(
    State(ctx): State<AppContext>,
) -> Result<Json<Vec<CourseResponse>>, AppError> {
    let conn = aula_db::pool::get_conn(&ctx.db)?;
    let courses = aula_db::queries::courses::list_courses(&conn)?;
    Ok(Json(courses.iter().map(CourseResponse::from_model).collect()))
}

/// GET /api/courses/{id}
#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(("id" = String, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course detail", body = CourseDetailResponse),
        (status = 404, description = "Course not found")
    )
)]
pub async fn get_course(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
    Path(id): Path<String>,
) -> Result<Json<CourseDetailResponse>, AppError> {
    let course_id: aula_core::CourseId = id
        .parse()
        .map_err(|_| aula_core::Error::Validation("Invalid course ID".into()))?;

    let conn = aula_db::pool::get_conn(&ctx.db)?;
    let course = aula_db::queries::courses::get_course(&conn, course_id)?
        .ok_or_else(|| aula_core::Error::not_found("course", course_id))?;

    let lectures = aula_db::queries::lectures::list_lectures_for_course(&conn, course_id)?;
    let enrollment = aula_db::queries::enrollments::get_enrollment(&conn, user_id, course_id)?;

    Ok(Json(CourseDetailResponse {
        course: CourseResponse::from_model(&course),
        lectures: lectures.iter().map(LectureResponse::from_model).collect(),
        enrollment_status: enrollment.map(|e| e.status.as_str().to_string()),
    }))
}

/// POST /api/courses (admin)
#[utoipa::path(
    post,
    path = "/api/courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn create_course(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
    Json(body): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<CourseResponse>), AppError> {
    let conn = aula_db::pool::get_conn(&ctx.db)?;
    require_admin(&conn, user_id)?;

    if body.title.trim().is_empty() {
        return Err(aula_core::Error::Validation("title is required".into()).into());
    }

    let course = aula_db::queries::courses::create_course(
        &conn,
        body.title.trim(),
        &body.description,
        &body.level,
    )?;

    Ok((StatusCode::CREATED, Json(CourseResponse::from_model(&course))))
}

/// DELETE /api/courses/{id} (admin)
#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    params(("id" = String, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course deleted"),
        (status = 404, description = "Course not found")
    )
)]
pub async fn delete_course(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let course_id: aula_core::CourseId = id
        .parse()
        .map_err(|_| aula_core::Error::Validation("Invalid course ID".into()))?;

    let conn = aula_db::pool::get_conn(&ctx.db)?;
    require_admin(&conn, user_id)?;

    if !aula_db::queries::courses::delete_course(&conn, course_id)? {
        return Err(aula_core::Error::not_found("course", course_id).into());
    }
    Ok(StatusCode::OK)
}
