//! Session API: the one request/response boundary the playback controller
//! calls on the server.
//!
//! [`SessionApi`] is a trait so the controller can be driven against a mock
//! in tests; [`HttpSessionApi`] is the reqwest-backed production
//! implementation speaking to the aula server.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use aula_core::LectureId;

use crate::session::PlaybackSession;

/// Errors from the session API, separated the way the controller needs
/// them: a denial is actionable and never retried, everything else is a
/// transport-level failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// The server refused the request with a reason code
    /// (`not_enrolled`, `enrollment_pending`, ...).
    #[error("denied ({code}): {message}")]
    Denied { code: String, message: String },

    /// The request could not be delivered or the connection failed.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with something unexpected.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl ApiError {
    /// True when the denial is something the viewer can act on by
    /// requesting enrollment, as opposed to a generic failure.
    pub fn is_enrollment_denial(&self) -> bool {
        matches!(
            self,
            ApiError::Denied { code, .. }
                if code == "not_enrolled" || code == "enrollment_pending"
        )
    }
}

/// The boundary the controller calls. Checkpoint submission is best-effort:
/// the controller fires it without blocking playback and only logs failures.
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Negotiate a playback session (access guard + issuer behind one call).
    async fn request_session(&self, lecture_id: LectureId)
        -> Result<PlaybackSession, ApiError>;

    /// Report a watched-position checkpoint.
    async fn submit_checkpoint(
        &self,
        lecture_id: LectureId,
        watched_seconds: i64,
    ) -> Result<(), ApiError>;

    /// Explicitly mark the lecture completed. Idempotent on the server.
    async fn request_completion(&self, lecture_id: LectureId) -> Result<(), ApiError>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GrantBody {
    signed_url: String,
    watermark_text: String,
    watermark_course: String,
    expires_at: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    code: Option<String>,
}

/// reqwest-backed [`SessionApi`] speaking to the aula HTTP API with a
/// bearer credential.
pub struct HttpSessionApi {
    client: reqwest::Client,
    base_url: String,
    bearer_token: String,
}

impl HttpSessionApi {
    pub fn new(base_url: impl Into<String>, bearer_token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token: bearer_token.into(),
        }
    }

    async fn post(
        &self,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let mut req = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.bearer_token);
        if let Some(body) = body {
            req = req.json(&body);
        }
        req.send().await.map_err(|e| ApiError::Network(e.to_string()))
    }
}

/// Turn a non-success response into the matching [`ApiError`].
async fn error_from_response(resp: reqwest::Response) -> ApiError {
    let status = resp.status();
    let body: ErrorBody = resp.json().await.unwrap_or(ErrorBody {
        error: None,
        code: None,
    });

    match body.code {
        Some(code) => ApiError::Denied {
            code,
            message: body.error.unwrap_or_else(|| status.to_string()),
        },
        None => ApiError::Protocol(format!(
            "unexpected status {status}: {}",
            body.error.unwrap_or_default()
        )),
    }
}

#[async_trait]
impl SessionApi for HttpSessionApi {
    async fn request_session(
        &self,
        lecture_id: LectureId,
    ) -> Result<PlaybackSession, ApiError> {
        let resp = self
            .post(&format!("/api/lectures/{lecture_id}/play"), None)
            .await?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }

        let body: GrantBody = resp
            .json()
            .await
            .map_err(|e| ApiError::Protocol(format!("bad grant body: {e}")))?;

        let expires_at: DateTime<Utc> = body
            .expires_at
            .parse()
            .map_err(|e| ApiError::Protocol(format!("bad expires_at: {e}")))?;

        Ok(PlaybackSession {
            lecture_id,
            signed_url: body.signed_url,
            watermark_text: body.watermark_text,
            watermark_course: body.watermark_course,
            expires_at,
        })
    }

    async fn submit_checkpoint(
        &self,
        lecture_id: LectureId,
        watched_seconds: i64,
    ) -> Result<(), ApiError> {
        let resp = self
            .post(
                &format!("/api/lectures/{lecture_id}/progress"),
                Some(serde_json::json!({ "watched_seconds": watched_seconds })),
            )
            .await?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        Ok(())
    }

    async fn request_completion(&self, lecture_id: LectureId) -> Result<(), ApiError> {
        let resp = self
            .post(&format!("/api/lectures/{lecture_id}/complete"), None)
            .await?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        Ok(())
    }
}
