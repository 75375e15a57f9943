//! Authentication middleware.
//!
//! Validates bearer tokens (or the session cookie) against the `auth_tokens`
//! table and injects the authenticated [`UserId`] into request extensions so
//! downstream handlers can access it. When auth is disabled every request
//! acts as the seeded anonymous admin user.

use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use rusqlite::Connection;

use aula_core::{Error, Result, UserId};
use aula_db::models::User;
use aula_db::pool::DbPool;

use crate::context::AppContext;

/// Cookie name for browser sessions.
pub const SESSION_COOKIE: &str = "aula_session";

/// Well-known user ID for unauthenticated requests (auth disabled).
const ANONYMOUS_USER_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Validate an auth token from raw HTTP header values.
///
/// Returns `Some(UserId)` on success, `None` on failure.
///
/// Token resolution order:
/// 1. `Authorization: Bearer <token>` (standard API/web)
/// 2. Cookie: `aula_session=<token>` (web browser)
pub fn validate_auth_headers(
    auth_config: &aula_core::config::AuthConfig,
    db: &DbPool,
    authorization: Option<&str>,
    cookie: Option<&str>,
) -> Option<UserId> {
    // If auth is not enabled, return the anonymous user.
    if !auth_config.enabled {
        return Some(
            ANONYMOUS_USER_ID
                .parse()
                .expect("static anonymous UUID is valid"),
        );
    }

    // 1. Authorization: Bearer header.
    if let Some(auth_value) = authorization {
        if let Some(token) = auth_value.strip_prefix("Bearer ") {
            if let Some(uid) = validate_token(auth_config, db, token) {
                return Some(uid);
            }
        }
    }

    // 2. Session cookie.
    if let Some(cookies_str) = cookie {
        for part in cookies_str.split(';') {
            let part = part.trim();
            if let Some(value) = part.strip_prefix(&format!("{SESSION_COOKIE}=")) {
                if let Some(uid) = validate_token(auth_config, db, value) {
                    return Some(uid);
                }
            }
        }
    }

    None
}

/// Validate a single token against the config API key and DB tokens.
fn validate_token(
    auth_config: &aula_core::config::AuthConfig,
    db: &DbPool,
    token: &str,
) -> Option<UserId> {
    // Static API key acts as the anonymous admin.
    if let Some(ref api_key) = auth_config.api_key {
        if token == api_key {
            return Some(
                ANONYMOUS_USER_ID
                    .parse()
                    .expect("static anonymous UUID is valid"),
            );
        }
    }

    // DB-backed bearer tokens, with expiry checked at use time.
    if let Ok(conn) = aula_db::pool::get_conn(db) {
        if let Ok(Some(tok)) = aula_db::queries::auth::get_token(&conn, token) {
            let valid = chrono::DateTime::parse_from_rfc3339(&tok.expires_at)
                .map(|exp| exp > Utc::now())
                .unwrap_or(false);
            if valid {
                return Some(tok.user_id);
            }
        }
    }

    None
}

/// Authentication middleware. Applied to protected routes only.
///
/// On success, inserts the resolved [`UserId`] into request extensions.
pub async fn auth_middleware(
    State(ctx): State<AppContext>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> std::result::Result<Response, Response> {
    let authorization = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_owned());

    let cookie = request
        .headers()
        .get(axum::http::header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_owned());

    match validate_auth_headers(
        &ctx.config.auth,
        &ctx.db,
        authorization.as_deref(),
        cookie.as_deref(),
    ) {
        Some(user_id) => {
            request.extensions_mut().insert(user_id);
            Ok(next.run(request).await)
        }
        None => Err((StatusCode::UNAUTHORIZED, "Authentication required").into_response()),
    }
}

/// Load the full user row for an authenticated [`UserId`].
pub fn load_user(conn: &Connection, user_id: UserId) -> Result<User> {
    aula_db::queries::users::get_user_by_id(conn, user_id)?
        .ok_or_else(|| Error::Unauthorized("Unknown user".into()))
}

/// Load the user and require the admin role.
pub fn require_admin(conn: &Connection, user_id: UserId) -> Result<User> {
    let user = load_user(conn, user_id)?;
    if !user.is_admin() {
        return Err(Error::Forbidden("admin role required".into()));
    }
    Ok(user)
}

/// Generate a bcrypt password hash.
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| Error::Internal(format!("bcrypt error: {e}")))
}
