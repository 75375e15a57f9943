//! Course catalog operations.

use chrono::Utc;
use rusqlite::Connection;

use aula_core::{CourseId, Error, Result};

use crate::models::Course;

const COLS: &str = "id, title, description, level, created_at";

/// Create a new course.
pub fn create_course(
    conn: &Connection,
    title: &str,
    description: &str,
    level: &str,
) -> Result<Course> {
    let id = CourseId::new();
    let created_at = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO courses (id, title, description, level, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![id.to_string(), title, description, level, created_at],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(Course {
        id,
        title: title.to_string(),
        description: description.to_string(),
        level: level.to_string(),
        created_at,
    })
}

/// Get a course by ID.
pub fn get_course(conn: &Connection, id: CourseId) -> Result<Option<Course>> {
    let q = format!("SELECT {COLS} FROM courses WHERE id = ?1");
    let result = conn.query_row(&q, [id.to_string()], Course::from_row);
    match result {
        Ok(c) => Ok(Some(c)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List all courses, newest first.
pub fn list_courses(conn: &Connection) -> Result<Vec<Course>> {
    let q = format!("SELECT {COLS} FROM courses ORDER BY created_at DESC");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], Course::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Delete a course by ID. Returns true if a row was deleted.
pub fn delete_course(conn: &Connection, id: CourseId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM courses WHERE id = ?1", [id.to_string()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}
