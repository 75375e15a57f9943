//! Lecture catalog operations.

use chrono::Utc;
use rusqlite::Connection;

use aula_core::{CourseId, Error, LectureId, Result};

use crate::models::Lecture;

const COLS: &str = "id, course_id, title, description, media_path, duration_secs, order_index, created_at";

/// Create a new lecture under a course.
#[allow(clippy::too_many_arguments)]
pub fn create_lecture(
    conn: &Connection,
    course_id: CourseId,
    title: &str,
    description: &str,
    media_path: &str,
    duration_secs: i64,
    order_index: i64,
) -> Result<Lecture> {
    let id = LectureId::new();
    let created_at = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO lectures (id, course_id, title, description, media_path, duration_secs, order_index, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            id.to_string(),
            course_id.to_string(),
            title,
            description,
            media_path,
            duration_secs,
            order_index,
            created_at
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(Lecture {
        id,
        course_id,
        title: title.to_string(),
        description: description.to_string(),
        media_path: media_path.to_string(),
        duration_secs,
        order_index,
        created_at,
    })
}

/// Get a lecture by ID.
pub fn get_lecture(conn: &Connection, id: LectureId) -> Result<Option<Lecture>> {
    let q = format!("SELECT {COLS} FROM lectures WHERE id = ?1");
    let result = conn.query_row(&q, [id.to_string()], Lecture::from_row);
    match result {
        Ok(l) => Ok(Some(l)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List lectures of a course in playback order.
pub fn list_lectures_for_course(conn: &Connection, course_id: CourseId) -> Result<Vec<Lecture>> {
    let q = format!("SELECT {COLS} FROM lectures WHERE course_id = ?1 ORDER BY order_index ASC");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([course_id.to_string()], Lecture::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Attach or replace the media file reference of a lecture.
pub fn set_lecture_media(
    conn: &Connection,
    id: LectureId,
    media_path: &str,
    duration_secs: i64,
) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE lectures SET media_path = ?1, duration_secs = ?2 WHERE id = ?3",
            rusqlite::params![media_path, duration_secs, id.to_string()],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Delete a lecture by ID.
pub fn delete_lecture(conn: &Connection, id: LectureId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM lectures WHERE id = ?1", [id.to_string()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;
    use crate::queries::courses;

    #[test]
    fn create_and_get() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let course = courses::create_course(&conn, "C", "", "beginner").unwrap();
        let lecture =
            create_lecture(&conn, course.id, "Intro", "First lecture", "intro.mp4", 120, 0)
                .unwrap();

        let found = get_lecture(&conn, lecture.id).unwrap().unwrap();
        assert_eq!(found.title, "Intro");
        assert_eq!(found.duration_secs, 120);
        assert_eq!(found.media_path, "intro.mp4");
    }

    #[test]
    fn list_ordered() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let course = courses::create_course(&conn, "C", "", "beginner").unwrap();
        create_lecture(&conn, course.id, "Second", "", "b.mp4", 60, 1).unwrap();
        create_lecture(&conn, course.id, "First", "", "a.mp4", 60, 0).unwrap();

        let lectures = list_lectures_for_course(&conn, course.id).unwrap();
        assert_eq!(lectures.len(), 2);
        assert_eq!(lectures[0].title, "First");
        assert_eq!(lectures[1].title, "Second");
    }

    #[test]
    fn update_media() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let course = courses::create_course(&conn, "C", "", "beginner").unwrap();
        let lecture = create_lecture(&conn, course.id, "L", "", "", 0, 0).unwrap();
        assert!(lecture.media_path.is_empty());

        assert!(set_lecture_media(&conn, lecture.id, "l.mp4", 300).unwrap());
        let found = get_lecture(&conn, lecture.id).unwrap().unwrap();
        assert_eq!(found.media_path, "l.mp4");
        assert_eq!(found.duration_secs, 300);
    }

    #[test]
    fn delete() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let course = courses::create_course(&conn, "C", "", "beginner").unwrap();
        let lecture = create_lecture(&conn, course.id, "L", "", "l.mp4", 60, 0).unwrap();

        assert!(delete_lecture(&conn, lecture.id).unwrap());
        assert!(get_lecture(&conn, lecture.id).unwrap().is_none());
    }
}
