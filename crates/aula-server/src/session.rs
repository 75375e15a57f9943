//! Playback session issuance.
//!
//! The issuer is the single gate between a viewer and a playable URL: it
//! consults the access guard, and only on `Allow` does it mint a signed,
//! time-limited media reference plus the watermark identity payload. On the
//! deny path no URL is ever constructed, so an unauthorized response cannot
//! leak a playable reference even transiently.

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use aula_core::config::Config;
use aula_core::{Error, LectureId, Result};
use aula_db::models::User;

use crate::access::{authorize_viewer, AccessDecision};
use crate::signer::{generate_secret, MediaClaims, MediaTokenSigner};

/// A granted playback session. Lives only for the duration of one playback
/// attempt on one controller instance; it is never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PlaybackSessionGrant {
    pub lecture_id: String,
    /// Signed, time-limited media reference.
    pub signed_url: String,
    /// Viewer identity payload for the watermark overlay.
    pub watermark_text: String,
    /// Course identity shown alongside the viewer identity.
    pub watermark_course: String,
    /// RFC 3339 expiry of the signed reference.
    pub expires_at: String,
}

/// Mints playback sessions. Construct once at startup and share via
/// [`crate::context::AppContext`].
pub struct SessionIssuer {
    signer: MediaTokenSigner,
    session_ttl_secs: u64,
    public_base_url: String,
}

impl SessionIssuer {
    pub fn new(secret: Vec<u8>, session_ttl_secs: u64, public_base_url: String) -> Self {
        Self {
            signer: MediaTokenSigner::new(secret),
            session_ttl_secs,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build an issuer from application config. An empty configured secret
    /// falls back to an ephemeral random one (tokens then die with the
    /// process; config validation warns about this).
    pub fn from_config(config: &Config) -> Self {
        let secret = if config.media.signing_secret.is_empty() {
            generate_secret()
        } else {
            config.media.signing_secret.clone()
        };
        Self::new(
            secret.into_bytes(),
            config.media.session_ttl_secs,
            config.media.public_base_url.clone(),
        )
    }

    /// Issue a playback session for `viewer` on `lecture_id`.
    ///
    /// Re-evaluates enrollment on every call; grants are never cached.
    pub fn issue(
        &self,
        conn: &Connection,
        viewer: &User,
        lecture_id: LectureId,
    ) -> Result<PlaybackSessionGrant> {
        let (lecture, decision) = authorize_viewer(conn, viewer.id, lecture_id)?;

        let lecture = match decision {
            AccessDecision::Deny(reason) => return Err(Error::denied(reason)),
            AccessDecision::Allow => lecture.expect("allow implies lecture exists"),
        };

        if lecture.media_path.is_empty() {
            return Err(Error::Validation("lecture has no video attached".into()));
        }

        let course = aula_db::queries::courses::get_course(conn, lecture.course_id)?
            .ok_or_else(|| Error::not_found("course", lecture.course_id))?;

        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.session_ttl_secs as i64);

        let token = self.signer.sign(&MediaClaims {
            lecture_id: lecture.id,
            viewer_id: viewer.id,
            exp: expires_at.timestamp(),
        });

        let signed_url = format!(
            "{}/api/media/stream/{}?token={}",
            self.public_base_url, lecture.id, token
        );

        tracing::info!(
            viewer = %viewer.id,
            lecture = %lecture.id,
            ttl_secs = self.session_ttl_secs,
            "Issued playback session"
        );

        Ok(PlaybackSessionGrant {
            lecture_id: lecture.id.to_string(),
            signed_url,
            watermark_text: watermark_identity(viewer, now),
            watermark_course: course.title,
            expires_at: expires_at.to_rfc3339(),
        })
    }

    /// Expose the signer for the media streaming route.
    pub fn signer(&self) -> &MediaTokenSigner {
        &self.signer
    }
}

/// Watermark identity payload: human-recognizable viewer label plus a
/// freshness timestamp. The client refreshes the timestamp locally on its
/// own rotation cadence.
fn watermark_identity(viewer: &User, at: DateTime<Utc>) -> String {
    format!(
        "{} | {}",
        viewer.display_name,
        at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use aula_core::DenyReason;
    use aula_db::pool::init_memory_pool;
    use aula_db::queries::{courses, enrollments, lectures, users};

    fn issuer() -> SessionIssuer {
        SessionIssuer::new(b"secret".to_vec(), 900, "http://localhost:8080/".into())
    }

    #[test]
    fn deny_paths_produce_typed_errors() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let user = users::create_user(&conn, "v", "h", "Vera", "student").unwrap();
        let course = courses::create_course(&conn, "C", "", "beginner").unwrap();
        let lecture =
            lectures::create_lecture(&conn, course.id, "L", "", "l.mp4", 120, 0).unwrap();

        // Unknown lecture.
        let err = issuer()
            .issue(&conn, &user, LectureId::new())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::AccessDenied {
                reason: DenyReason::LectureNotFound
            }
        ));

        // No enrollment.
        let err = issuer().issue(&conn, &user, lecture.id).unwrap_err();
        assert!(matches!(
            err,
            Error::AccessDenied {
                reason: DenyReason::NotEnrolled
            }
        ));

        // Pending enrollment.
        enrollments::request_enrollment(&conn, user.id, course.id).unwrap();
        let err = issuer().issue(&conn, &user, lecture.id).unwrap_err();
        assert!(matches!(
            err,
            Error::AccessDenied {
                reason: DenyReason::EnrollmentPending
            }
        ));
    }

    #[test]
    fn approved_viewer_gets_bound_grant() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let user = users::create_user(&conn, "v", "h", "Vera Lane", "student").unwrap();
        let course = courses::create_course(&conn, "Rust 101", "", "beginner").unwrap();
        let lecture =
            lectures::create_lecture(&conn, course.id, "L", "", "l.mp4", 120, 0).unwrap();
        let e = enrollments::request_enrollment(&conn, user.id, course.id).unwrap();
        enrollments::approve_enrollment(&conn, e.id).unwrap();

        let issuer = issuer();
        let grant = issuer.issue(&conn, &user, lecture.id).unwrap();

        assert!(grant.signed_url.starts_with(&format!(
            "http://localhost:8080/api/media/stream/{}?token=",
            lecture.id
        )));
        assert!(grant.watermark_text.contains("Vera Lane"));
        assert_eq!(grant.watermark_course, "Rust 101");

        // Token embedded in the URL is bound to this viewer and lecture.
        let token = grant.signed_url.split("token=").nth(1).unwrap();
        let claims = issuer.signer().verify(token).unwrap();
        assert_eq!(claims.viewer_id, user.id);
        assert_eq!(claims.lecture_id, lecture.id);
    }

    #[test]
    fn lecture_without_video_is_rejected() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let user = users::create_user(&conn, "v", "h", "V", "student").unwrap();
        let course = courses::create_course(&conn, "C", "", "beginner").unwrap();
        let lecture = lectures::create_lecture(&conn, course.id, "L", "", "", 0, 0).unwrap();
        let e = enrollments::request_enrollment(&conn, user.id, course.id).unwrap();
        enrollments::approve_enrollment(&conn, e.id).unwrap();

        let err = issuer().issue(&conn, &user, lecture.id).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn from_config_generates_ephemeral_secret_when_empty() {
        let config = Config::default();
        assert!(config.media.signing_secret.is_empty());
        // Must not panic; grants from this issuer simply die with the process.
        let _issuer = SessionIssuer::from_config(&config);
    }
}
