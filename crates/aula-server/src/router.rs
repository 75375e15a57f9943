//! Axum router construction.
//!
//! Builds the full application router with all route groups, middleware
//! layers, and static file serving.

use axum::extract::Extension;
use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::context::AppContext;
use crate::middleware::auth::auth_middleware;
use crate::middleware::rate_limit::rate_limit_middleware;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::auth::signup,
        routes::auth::login,
        routes::auth::logout,
        routes::auth::auth_status,
        routes::courses::list_courses,
        routes::courses::get_course,
        routes::courses::create_course,
        routes::courses::delete_course,
        routes::lectures::get_lecture,
        routes::lectures::create_lecture,
        routes::lectures::set_lecture_media,
        routes::lectures::delete_lecture,
        routes::enrollments::enroll,
        routes::enrollments::list_enrollments,
        routes::enrollments::my_enrollments,
        routes::enrollments::approve_enrollment,
        routes::playback::play,
        routes::playback::update_progress,
        routes::playback::complete,
        routes::playback::list_progress,
        routes::playback::get_progress,
    ),
    components(schemas(
        routes::auth::SignupRequest,
        routes::auth::LoginRequest,
        routes::auth::AuthResponse,
        routes::auth::AuthStatusResponse,
        routes::courses::CreateCourseRequest,
        routes::courses::CourseResponse,
        routes::courses::CourseDetailResponse,
        routes::lectures::CreateLectureRequest,
        routes::lectures::SetMediaRequest,
        routes::lectures::LectureResponse,
        routes::enrollments::EnrollmentResponse,
        routes::playback::ProgressRequest,
        routes::playback::ProgressResponse,
        crate::session::PlaybackSessionGrant,
    ))
)]
struct ApiDoc;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext, static_dir: Option<PathBuf>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Auth routes -- always accessible.
    let auth_routes = Router::new()
        .route("/auth/signup", post(routes::auth::signup))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/logout", post(routes::auth::logout))
        .route("/auth/status", get(routes::auth::auth_status));

    // Session issuance gets its own rate limit on top of auth.
    let play_route = Router::new()
        .route("/lectures/{id}/play", post(routes::playback::play))
        .layer(middleware::from_fn(rate_limit_middleware))
        .layer(Extension(ctx.play_limiter.clone()));

    // Protected API routes.
    let protected_routes = Router::new()
        // Courses
        .route("/courses", get(routes::courses::list_courses))
        .route("/courses", post(routes::courses::create_course))
        .route("/courses/{id}", get(routes::courses::get_course))
        .route("/courses/{id}", delete(routes::courses::delete_course))
        .route(
            "/courses/{id}/lectures",
            post(routes::lectures::create_lecture),
        )
        .route("/courses/{id}/enroll", post(routes::enrollments::enroll))
        // Lectures
        .route("/lectures/{id}", get(routes::lectures::get_lecture))
        .route("/lectures/{id}", delete(routes::lectures::delete_lecture))
        .route(
            "/lectures/{id}/media",
            put(routes::lectures::set_lecture_media),
        )
        // Enrollments
        .route("/enrollments", get(routes::enrollments::list_enrollments))
        .route(
            "/enrollments/mine",
            get(routes::enrollments::my_enrollments),
        )
        .route(
            "/enrollments/{id}/approve",
            post(routes::enrollments::approve_enrollment),
        )
        // Watched progress
        .route(
            "/lectures/{id}/progress",
            post(routes::playback::update_progress),
        )
        .route(
            "/lectures/{id}/progress",
            get(routes::playback::get_progress),
        )
        .route("/lectures/{id}/complete", post(routes::playback::complete))
        .route("/progress", get(routes::playback::list_progress))
        .merge(play_route);

    // Always apply auth middleware -- it handles both enabled (validates
    // credentials) and disabled (injects anonymous UserId) modes. Without
    // it, Extension<UserId> extractors would fail with 500.
    let protected_routes =
        protected_routes.layer(middleware::from_fn_with_state(ctx.clone(), auth_middleware));

    // The streaming route authenticates with the signed token itself, not a
    // bearer header: it must be fetchable by a bare <video> element.
    let media_routes = Router::new().route(
        "/media/stream/{lecture_id}",
        get(routes::media::stream_lecture),
    );

    let api = auth_routes.merge(protected_routes).merge(media_routes);

    let mut app = Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api)
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx);

    // Static file serving for UI build.
    if let Some(dir) = static_dir {
        if dir.exists() {
            tracing::info!("Serving static files from {:?}", dir);
            let index_path = dir.join("index.html");
            app = app.fallback_service(
                tower_http::services::ServeDir::new(&dir)
                    .append_index_html_on_directories(true)
                    .not_found_service(tower_http::services::ServeFile::new(index_path)),
            );
        }
    }

    app
}
