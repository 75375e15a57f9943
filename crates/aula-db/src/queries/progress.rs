//! Watched-progress checkpoint store.
//!
//! Checkpoint writes may arrive out of order or duplicated; the merge is
//! `MAX(stored, submitted)` so final state is order-independent. Completion
//! is derived at most once per (user, lecture): `completed_at` keeps the
//! first timestamp forever, and a duration of zero (unknown) never
//! completes.

use chrono::Utc;
use rusqlite::Connection;

use aula_core::{Error, LectureId, Result, UserId};

use crate::models::LectureProgress;

const COLS: &str = "user_id, lecture_id, watched_seconds, completed, completed_at, updated_at";

/// Record a watched-position checkpoint and derive completion.
///
/// The stored value becomes `max(previous, watched_seconds)`. If the merged
/// value reaches `duration_secs` (and the duration is known), the row is
/// marked completed with the current timestamp -- unless it already was,
/// in which case the original `completed_at` is preserved.
pub fn record_progress(
    conn: &Connection,
    user_id: UserId,
    lecture_id: LectureId,
    watched_seconds: i64,
    duration_secs: i64,
) -> Result<LectureProgress> {
    if watched_seconds < 0 {
        return Err(Error::Validation("watched_seconds must be >= 0".into()));
    }

    let now = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO lecture_progress (user_id, lecture_id, watched_seconds, completed, updated_at)
         VALUES (?1, ?2, ?3, 0, ?4)
         ON CONFLICT(user_id, lecture_id) DO UPDATE SET
            watched_seconds = MAX(watched_seconds, excluded.watched_seconds),
            updated_at = excluded.updated_at",
        rusqlite::params![
            user_id.to_string(),
            lecture_id.to_string(),
            watched_seconds,
            now
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    // Completion boundary: only when the duration is known, and only once.
    if duration_secs > 0 {
        conn.execute(
            "UPDATE lecture_progress
             SET completed = 1, completed_at = COALESCE(completed_at, ?3)
             WHERE user_id = ?1 AND lecture_id = ?2
               AND completed = 0 AND watched_seconds >= ?4",
            rusqlite::params![user_id.to_string(), lecture_id.to_string(), now, duration_secs],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    }

    get_progress(conn, user_id, lecture_id)
        .map(|opt| opt.expect("progress row exists after upsert"))
}

/// Explicitly mark a lecture completed.
///
/// Idempotent: calling this twice produces one completion fact carrying the
/// first timestamp. Refused when the lecture duration is unknown, so a
/// metadata race can never fabricate a completion.
pub fn mark_complete(
    conn: &Connection,
    user_id: UserId,
    lecture_id: LectureId,
    duration_secs: i64,
) -> Result<LectureProgress> {
    if duration_secs <= 0 {
        return Err(Error::Validation(
            "cannot complete a lecture with unknown duration".into(),
        ));
    }

    let now = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO lecture_progress
            (user_id, lecture_id, watched_seconds, completed, completed_at, updated_at)
         VALUES (?1, ?2, ?3, 1, ?4, ?4)
         ON CONFLICT(user_id, lecture_id) DO UPDATE SET
            watched_seconds = MAX(watched_seconds, excluded.watched_seconds),
            completed = 1,
            completed_at = COALESCE(completed_at, excluded.completed_at),
            updated_at = excluded.updated_at",
        rusqlite::params![
            user_id.to_string(),
            lecture_id.to_string(),
            duration_secs,
            now
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    get_progress(conn, user_id, lecture_id)
        .map(|opt| opt.expect("progress row exists after upsert"))
}

/// Get progress for a (user, lecture) pair.
pub fn get_progress(
    conn: &Connection,
    user_id: UserId,
    lecture_id: LectureId,
) -> Result<Option<LectureProgress>> {
    let q = format!("SELECT {COLS} FROM lecture_progress WHERE user_id = ?1 AND lecture_id = ?2");
    let result = conn.query_row(
        &q,
        rusqlite::params![user_id.to_string(), lecture_id.to_string()],
        LectureProgress::from_row,
    );
    match result {
        Ok(p) => Ok(Some(p)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List all progress rows of a user, most recently updated first.
/// Used for resume positions ("continue watching").
pub fn list_progress_for_user(conn: &Connection, user_id: UserId) -> Result<Vec<LectureProgress>> {
    let q = format!(
        "SELECT {COLS} FROM lecture_progress WHERE user_id = ?1 ORDER BY updated_at DESC"
    );
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([user_id.to_string()], LectureProgress::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;
    use crate::queries::{courses, lectures, users};

    fn setup() -> (crate::pool::DbPool, UserId, LectureId) {
        let pool = init_memory_pool().unwrap();
        let (user_id, lecture_id) = {
            let conn = pool.get().unwrap();
            let user = users::create_user(&conn, "viewer", "h", "Viewer", "student").unwrap();
            let course = courses::create_course(&conn, "C", "", "beginner").unwrap();
            let lecture =
                lectures::create_lecture(&conn, course.id, "L", "", "l.mp4", 120, 0).unwrap();
            (user.id, lecture.id)
        };
        (pool, user_id, lecture_id)
    }

    #[test]
    fn merge_keeps_maximum_regardless_of_order() {
        let (pool, uid, lid) = setup();
        let conn = pool.get().unwrap();

        // 50 then 40 then 130: stored value never regresses.
        let p = record_progress(&conn, uid, lid, 50, 120).unwrap();
        assert_eq!(p.watched_seconds, 50);
        assert!(!p.completed);

        let p = record_progress(&conn, uid, lid, 40, 120).unwrap();
        assert_eq!(p.watched_seconds, 50);
        assert!(!p.completed);

        let p = record_progress(&conn, uid, lid, 130, 120).unwrap();
        assert_eq!(p.watched_seconds, 130);
        assert!(p.completed, "130 >= 120 must complete");
        assert!(p.completed_at.is_some());
    }

    #[test]
    fn merge_is_order_independent() {
        let values = [30i64, 110, 70, 110, 5];

        let (pool_a, uid_a, lid_a) = setup();
        let conn_a = pool_a.get().unwrap();
        for v in values {
            record_progress(&conn_a, uid_a, lid_a, v, 120).unwrap();
        }
        let forward = get_progress(&conn_a, uid_a, lid_a).unwrap().unwrap();

        let (pool_b, uid_b, lid_b) = setup();
        let conn_b = pool_b.get().unwrap();
        for v in values.iter().rev() {
            record_progress(&conn_b, uid_b, lid_b, *v, 120).unwrap();
        }
        let reverse = get_progress(&conn_b, uid_b, lid_b).unwrap().unwrap();

        assert_eq!(forward.watched_seconds, 110);
        assert_eq!(reverse.watched_seconds, 110);
        assert_eq!(forward.completed, reverse.completed);
    }

    #[test]
    fn zero_duration_never_completes() {
        let (pool, uid, lid) = setup();
        let conn = pool.get().unwrap();

        let p = record_progress(&conn, uid, lid, 9999, 0).unwrap();
        assert_eq!(p.watched_seconds, 9999);
        assert!(!p.completed);
        assert!(p.completed_at.is_none());
    }

    #[test]
    fn completed_at_is_written_once() {
        let (pool, uid, lid) = setup();
        let conn = pool.get().unwrap();

        let first = record_progress(&conn, uid, lid, 120, 120).unwrap();
        let stamp = first.completed_at.clone().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(10));
        let second = record_progress(&conn, uid, lid, 150, 120).unwrap();
        assert_eq!(second.completed_at.unwrap(), stamp);
    }

    #[test]
    fn mark_complete_is_idempotent() {
        let (pool, uid, lid) = setup();
        let conn = pool.get().unwrap();

        let first = mark_complete(&conn, uid, lid, 120).unwrap();
        assert!(first.completed);
        assert_eq!(first.watched_seconds, 120);
        let stamp = first.completed_at.clone().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(10));
        let second = mark_complete(&conn, uid, lid, 120).unwrap();
        assert!(second.completed);
        assert_eq!(
            second.completed_at.unwrap(),
            stamp,
            "second completion must not produce a new fact"
        );
    }

    #[test]
    fn mark_complete_rejects_unknown_duration() {
        let (pool, uid, lid) = setup();
        let conn = pool.get().unwrap();

        let err = mark_complete(&conn, uid, lid, 0).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(get_progress(&conn, uid, lid).unwrap().is_none());
    }

    #[test]
    fn mark_complete_never_lowers_watched() {
        let (pool, uid, lid) = setup();
        let conn = pool.get().unwrap();

        record_progress(&conn, uid, lid, 500, 120).unwrap();
        let p = mark_complete(&conn, uid, lid, 120).unwrap();
        assert_eq!(p.watched_seconds, 500);
    }

    #[test]
    fn negative_checkpoint_rejected() {
        let (pool, uid, lid) = setup();
        let conn = pool.get().unwrap();

        let err = record_progress(&conn, uid, lid, -1, 120).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn list_for_user_orders_by_recency() {
        let (pool, uid, lid) = setup();
        let conn = pool.get().unwrap();
        let course = courses::create_course(&conn, "D", "", "beginner").unwrap();
        let other =
            lectures::create_lecture(&conn, course.id, "L2", "", "l2.mp4", 60, 0).unwrap();

        record_progress(&conn, uid, lid, 10, 120).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));
        record_progress(&conn, uid, other.id, 20, 60).unwrap();

        let list = list_progress_for_user(&conn, uid).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].lecture_id, other.id);
    }
}
