//! Query modules, one per entity.

pub mod auth;
pub mod courses;
pub mod enrollments;
pub mod lectures;
pub mod progress;
pub mod users;
