//! Route handlers for the HTTP API.

pub mod auth;
pub mod courses;
pub mod enrollments;
pub mod health;
pub mod lectures;
pub mod media;
pub mod playback;
