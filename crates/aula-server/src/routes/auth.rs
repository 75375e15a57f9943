//! Authentication route handlers: signup, login, logout, status.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::auth::{hash_password, SESSION_COOKIE};

/// Signup request payload.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub display_name: String,
}

/// Login request payload.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login/signup response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Auth status response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthStatusResponse {
    pub auth_enabled: bool,
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// POST /api/auth/signup
///
/// Create a student account. Admin accounts are provisioned via the
/// bootstrap config, never through signup.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 409, description = "Username already exists")
    )
)]
pub async fn signup(
    State(ctx): State<AppContext>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.username.trim().is_empty() {
        return Err(aula_core::Error::Validation("username is required".into()).into());
    }
    if payload.password.len() < 8 {
        return Err(
            aula_core::Error::Validation("password must be at least 8 characters".into()).into(),
        );
    }
    let display_name = if payload.display_name.trim().is_empty() {
        payload.username.clone()
    } else {
        payload.display_name.trim().to_string()
    };

    let conn = aula_db::pool::get_conn(&ctx.db)?;
    let hash = hash_password(&payload.password)?;
    let user = aula_db::queries::users::create_user(
        &conn,
        payload.username.trim(),
        &hash,
        &display_name,
        "student",
    )?;

    tracing::info!(user = %user.id, "Student account created");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            message: "Account created".into(),
            token: None,
        }),
    ))
}

/// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(ctx): State<AppContext>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !ctx.config.auth.enabled {
        return Ok((
            StatusCode::OK,
            Json(AuthResponse {
                success: true,
                message: "Auth disabled".into(),
                token: None,
            }),
        ));
    }

    let conn = aula_db::pool::get_conn(&ctx.db)?;

    let user = aula_db::queries::users::get_user_by_username(&conn, &payload.username)?
        .ok_or_else(|| aula_core::Error::Unauthorized("Invalid credentials".into()))?;

    let password_valid = user.password_hash.starts_with("$2")
        && bcrypt::verify(&payload.password, &user.password_hash).unwrap_or(false);

    if !password_valid {
        return Err(aula_core::Error::Unauthorized("Invalid credentials".into()).into());
    }

    let token = uuid::Uuid::new_v4().to_string();
    let expires = Utc::now() + Duration::hours(ctx.config.auth.session_timeout_hours as i64);

    aula_db::queries::auth::create_token(&conn, user.id, &token, &expires.to_rfc3339())?;

    Ok((
        StatusCode::OK,
        Json(AuthResponse {
            success: true,
            message: "Login successful".into(),
            token: Some(token),
        }),
    ))
}

/// POST /api/auth/logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out")
    )
)]
pub async fn logout(
    State(ctx): State<AppContext>,
    headers: axum::http::HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    if let Some(token) = extract_token(&headers) {
        if let Ok(conn) = aula_db::pool::get_conn(&ctx.db) {
            let _ = aula_db::queries::auth::delete_token(&conn, &token);
        }
    }

    Ok(StatusCode::OK)
}

/// GET /api/auth/status
#[utoipa::path(
    get,
    path = "/api/auth/status",
    responses(
        (status = 200, description = "Auth status", body = AuthStatusResponse)
    )
)]
pub async fn auth_status(
    State(ctx): State<AppContext>,
    headers: axum::http::HeaderMap,
) -> Json<AuthStatusResponse> {
    let auth_config = &ctx.config.auth;

    if !auth_config.enabled {
        return Json(AuthStatusResponse {
            auth_enabled: false,
            authenticated: true,
            user_id: None,
            username: None,
            role: Some("admin".into()),
        });
    }

    if let Some(token) = extract_token(&headers) {
        if let Some(ref api_key) = auth_config.api_key {
            if token == *api_key {
                return Json(AuthStatusResponse {
                    auth_enabled: true,
                    authenticated: true,
                    user_id: None,
                    username: None,
                    role: Some("admin".into()),
                });
            }
        }

        if let Ok(conn) = aula_db::pool::get_conn(&ctx.db) {
            if let Ok(Some(tok)) = aula_db::queries::auth::get_token(&conn, &token) {
                let user = aula_db::queries::users::get_user_by_id(&conn, tok.user_id)
                    .ok()
                    .flatten();
                return Json(AuthStatusResponse {
                    auth_enabled: true,
                    authenticated: true,
                    user_id: Some(tok.user_id.to_string()),
                    username: user.as_ref().map(|u| u.username.clone()),
                    role: user.map(|u| u.role),
                });
            }
        }
    }

    Json(AuthStatusResponse {
        auth_enabled: true,
        authenticated: false,
        user_id: None,
        username: None,
        role: None,
    })
}

/// Extract a bearer token or session cookie from request headers.
fn extract_token(headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get(axum::http::header::AUTHORIZATION) {
        if let Ok(val) = auth.to_str() {
            if let Some(token) = val.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie) = headers.get(axum::http::header::COOKIE) {
        if let Ok(cookies_str) = cookie.to_str() {
            for part in cookies_str.split(';') {
                let part = part.trim();
                if let Some(value) = part.strip_prefix(&format!("{SESSION_COOKIE}=")) {
                    return Some(value.to_string());
                }
            }
        }
    }

    None
}
