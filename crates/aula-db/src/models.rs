//! Rust structs mapping to database tables.
//!
//! Each model implements `from_row` for constructing itself from a
//! `rusqlite::Row`.

use uuid::Uuid;

use aula_core::{CourseId, EnrollmentId, LectureId, TokenId, UserId};

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

/// Parse a UUID-based ID from a text column.
fn parse_id<T: From<Uuid>>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    let uuid = Uuid::parse_str(&s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(T::from(uuid))
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    /// Human-recognizable label used in watermark identity payloads.
    pub display_name: String,
    pub role: String,
    pub created_at: String,
}

impl User {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
            display_name: row.get(3)?,
            role: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

// ---------------------------------------------------------------------------
// AuthToken
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AuthToken {
    pub id: TokenId,
    pub user_id: UserId,
    pub token: String,
    pub expires_at: String,
}

impl AuthToken {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            user_id: parse_id(row, 1)?,
            token: row.get(2)?,
            expires_at: row.get(3)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Course
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub description: String,
    pub level: String,
    pub created_at: String,
}

impl Course {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            level: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Lecture
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Lecture {
    pub id: LectureId,
    pub course_id: CourseId,
    pub title: String,
    pub description: String,
    /// Path of the video file relative to `media.storage_dir`; empty until
    /// a video has been attached.
    pub media_path: String,
    /// Duration in seconds; 0 means unknown (metadata not yet loaded).
    pub duration_secs: i64,
    pub order_index: i64,
    pub created_at: String,
}

impl Lecture {
    /// Build from a row selected as:
    /// id, course_id, title, description, media_path, duration_secs,
    /// order_index, created_at
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            course_id: parse_id(row, 1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            media_path: row.get(4)?,
            duration_secs: row.get(5)?,
            order_index: row.get(6)?,
            created_at: row.get(7)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Enrollment
// ---------------------------------------------------------------------------

/// Enrollment status as stored in the DB. A missing row means the viewer is
/// not enrolled at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentStatus {
    Pending,
    Approved,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Pending => "pending",
            EnrollmentStatus::Approved => "approved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(EnrollmentStatus::Pending),
            "approved" => Some(EnrollmentStatus::Approved),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub status: EnrollmentStatus,
    pub requested_at: String,
    pub decided_at: Option<String>,
}

impl Enrollment {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        let status_str: String = row.get(3)?;
        let status = EnrollmentStatus::parse(&status_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                format!("unknown enrollment status: {status_str}").into(),
            )
        })?;
        Ok(Self {
            id: parse_id(row, 0)?,
            user_id: parse_id(row, 1)?,
            course_id: parse_id(row, 2)?,
            status,
            requested_at: row.get(4)?,
            decided_at: row.get(5)?,
        })
    }
}

// ---------------------------------------------------------------------------
// LectureProgress
// ---------------------------------------------------------------------------

/// Watched-position checkpoint plus completion fact for one
/// (user, lecture) pair.
#[derive(Debug, Clone)]
pub struct LectureProgress {
    pub user_id: UserId,
    pub lecture_id: LectureId,
    pub watched_seconds: i64,
    pub completed: bool,
    pub completed_at: Option<String>,
    pub updated_at: String,
}

impl LectureProgress {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: parse_id(row, 0)?,
            lecture_id: parse_id(row, 1)?,
            watched_seconds: row.get(2)?,
            completed: row.get::<_, i32>(3)? != 0,
            completed_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}
