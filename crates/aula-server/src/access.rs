//! Access guard: decides whether a playback session may be issued for a
//! (viewer, lecture) pair.
//!
//! The decision itself is a pure function over the lecture row and the
//! viewer's enrollment state; [`authorize_viewer`] loads both fresh from the
//! database on every call. Decisions are never cached -- enrollment state
//! can change between requests.

use rusqlite::Connection;

use aula_core::{DenyReason, LectureId, Result, UserId};
use aula_db::models::{EnrollmentStatus, Lecture};
use aula_db::queries::{enrollments, lectures};

/// Outcome of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Deny(DenyReason),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }
}

/// Pure decision function: no side effects, no I/O.
pub fn authorize(
    lecture: Option<&Lecture>,
    enrollment: Option<EnrollmentStatus>,
) -> AccessDecision {
    if lecture.is_none() {
        return AccessDecision::Deny(DenyReason::LectureNotFound);
    }
    match enrollment {
        None => AccessDecision::Deny(DenyReason::NotEnrolled),
        Some(EnrollmentStatus::Pending) => AccessDecision::Deny(DenyReason::EnrollmentPending),
        Some(EnrollmentStatus::Approved) => AccessDecision::Allow,
    }
}

/// Load the lecture and the viewer's enrollment state, then decide.
///
/// Returns the lecture alongside the decision so callers that were allowed
/// do not have to re-fetch it.
pub fn authorize_viewer(
    conn: &Connection,
    viewer_id: UserId,
    lecture_id: LectureId,
) -> Result<(Option<Lecture>, AccessDecision)> {
    let lecture = lectures::get_lecture(conn, lecture_id)?;

    let enrollment = match &lecture {
        Some(l) => {
            enrollments::get_enrollment(conn, viewer_id, l.course_id)?.map(|e| e.status)
        }
        None => None,
    };

    let decision = authorize(lecture.as_ref(), enrollment);
    Ok((lecture, decision))
}
