//! Unified error type for the aula application.
//!
//! All crates funnel their failures into [`Error`], which carries enough
//! context for API handlers to derive an HTTP status code via
//! [`Error::http_status`] and a machine-readable reason code via
//! [`Error::code`]. The playback path depends on the code field: clients
//! must be able to tell an actionable enrollment denial apart from a
//! generic failure, and an expired signed reference apart from a bad one.

use std::fmt;

/// Why the Access Guard refused to issue a playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The viewer has no enrollment for the lecture's course.
    NotEnrolled,
    /// The viewer's enrollment exists but has not been approved.
    EnrollmentPending,
    /// The lecture does not exist.
    LectureNotFound,
}

impl DenyReason {
    /// Stable machine-readable code exposed to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::NotEnrolled => "not_enrolled",
            DenyReason::EnrollmentPending => "enrollment_pending",
            DenyReason::LectureNotFound => "lecture_not_found",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::NotEnrolled => write!(f, "not enrolled in this course"),
            DenyReason::EnrollmentPending => write!(f, "enrollment is awaiting approval"),
            DenyReason::LectureNotFound => write!(f, "lecture not found"),
        }
    }
}

/// Unified error type covering all failure modes in aula.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "lecture", "course").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// The caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The caller lacks permission for the requested action.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The Access Guard refused to grant a playback session.
    #[error("Access denied: {reason}")]
    AccessDenied {
        /// Why the session was refused.
        reason: DenyReason,
    },

    /// A signed media reference has lapsed.
    #[error("Playback session expired")]
    SessionExpired,

    /// Request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A conflicting resource already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A database operation failed.
    #[error("Database error: {source}")]
    Database {
        /// The underlying database error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::Unauthorized(_) => 401,
            Error::SessionExpired => 401,
            Error::Forbidden(_) => 403,
            Error::AccessDenied { reason } => match reason {
                DenyReason::LectureNotFound => 404,
                _ => 403,
            },
            Error::Validation(_) => 400,
            Error::Conflict(_) => 409,
            Error::Database { .. } => 500,
            Error::Io { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "not_found",
            Error::Unauthorized(_) => "unauthorized",
            Error::SessionExpired => "session_expired",
            Error::Forbidden(_) => "forbidden",
            Error::AccessDenied { reason } => reason.code(),
            Error::Validation(_) => "validation_error",
            Error::Conflict(_) => "conflict",
            Error::Database { .. } => "database_error",
            Error::Io { .. } => "io_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Database`].
    pub fn database(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Database {
            source: source.into(),
        }
    }

    /// Convenience constructor for [`Error::AccessDenied`].
    pub fn denied(reason: DenyReason) -> Self {
        Error::AccessDenied { reason }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
