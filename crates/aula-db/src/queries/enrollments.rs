//! Enrollment state operations.
//!
//! Enrollment rows move `pending -> approved`; a missing row means the user
//! is not enrolled. The playback path only ever *reads* enrollment state
//! (through the access guard); mutation happens exclusively here via the
//! explicit request/approve endpoints.

use chrono::Utc;
use rusqlite::Connection;

use aula_core::{CourseId, EnrollmentId, Error, Result, UserId};

use crate::models::{Enrollment, EnrollmentStatus};

const COLS: &str = "id, user_id, course_id, status, requested_at, decided_at";

/// Request enrollment for a user into a course.
///
/// Idempotent: if a row already exists (any status) it is returned
/// unchanged instead of creating a duplicate.
pub fn request_enrollment(
    conn: &Connection,
    user_id: UserId,
    course_id: CourseId,
) -> Result<Enrollment> {
    if let Some(existing) = get_enrollment(conn, user_id, course_id)? {
        return Ok(existing);
    }

    let id = EnrollmentId::new();
    let requested_at = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO enrollments (id, user_id, course_id, status, requested_at)
         VALUES (?1, ?2, ?3, 'pending', ?4)",
        rusqlite::params![
            id.to_string(),
            user_id.to_string(),
            course_id.to_string(),
            requested_at
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(Enrollment {
        id,
        user_id,
        course_id,
        status: EnrollmentStatus::Pending,
        requested_at,
        decided_at: None,
    })
}

/// Get the enrollment of a user in a course, if any.
pub fn get_enrollment(
    conn: &Connection,
    user_id: UserId,
    course_id: CourseId,
) -> Result<Option<Enrollment>> {
    let q = format!("SELECT {COLS} FROM enrollments WHERE user_id = ?1 AND course_id = ?2");
    let result = conn.query_row(
        &q,
        rusqlite::params![user_id.to_string(), course_id.to_string()],
        Enrollment::from_row,
    );
    match result {
        Ok(e) => Ok(Some(e)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Get an enrollment by its own ID.
pub fn get_enrollment_by_id(conn: &Connection, id: EnrollmentId) -> Result<Option<Enrollment>> {
    let q = format!("SELECT {COLS} FROM enrollments WHERE id = ?1");
    let result = conn.query_row(&q, [id.to_string()], Enrollment::from_row);
    match result {
        Ok(e) => Ok(Some(e)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List all enrollments, pending first, newest request first within status.
pub fn list_enrollments(conn: &Connection) -> Result<Vec<Enrollment>> {
    let q = format!(
        "SELECT {COLS} FROM enrollments
         ORDER BY CASE status WHEN 'pending' THEN 0 ELSE 1 END, requested_at DESC"
    );
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], Enrollment::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// List all enrollments of one user.
pub fn list_enrollments_for_user(conn: &Connection, user_id: UserId) -> Result<Vec<Enrollment>> {
    let q = format!("SELECT {COLS} FROM enrollments WHERE user_id = ?1 ORDER BY requested_at DESC");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([user_id.to_string()], Enrollment::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Approve an enrollment. Idempotent: approving an already-approved
/// enrollment keeps the original decision timestamp.
pub fn approve_enrollment(conn: &Connection, id: EnrollmentId) -> Result<Option<Enrollment>> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "UPDATE enrollments
         SET status = 'approved', decided_at = COALESCE(decided_at, ?1)
         WHERE id = ?2",
        rusqlite::params![now, id.to_string()],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    get_enrollment_by_id(conn, id)
}
