//! User CRUD operations.

use chrono::Utc;
use rusqlite::Connection;

use aula_core::{Error, Result, UserId};

use crate::models::User;

const COLS: &str = "id, username, password_hash, display_name, role, created_at";

/// Create a new user and return it.
pub fn create_user(
    conn: &Connection,
    username: &str,
    password_hash: &str,
    display_name: &str,
    role: &str,
) -> Result<User> {
    let id = UserId::new();
    let created_at = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO users (id, username, password_hash, display_name, role, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            id.to_string(),
            username,
            password_hash,
            display_name,
            role,
            created_at
        ],
    )
    .map_err(|e| {
        if e.to_string().contains("UNIQUE constraint failed") {
            Error::Conflict(format!("Username '{username}' already exists"))
        } else {
            Error::database(e.to_string())
        }
    })?;

    Ok(User {
        id,
        username: username.to_string(),
        password_hash: password_hash.to_string(),
        display_name: display_name.to_string(),
        role: role.to_string(),
        created_at,
    })
}

/// Get a user by primary key.
pub fn get_user_by_id(conn: &Connection, id: UserId) -> Result<Option<User>> {
    let q = format!("SELECT {COLS} FROM users WHERE id = ?1");
    let result = conn.query_row(&q, [id.to_string()], User::from_row);
    match result {
        Ok(u) => Ok(Some(u)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Get a user by username.
pub fn get_user_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    let q = format!("SELECT {COLS} FROM users WHERE username = ?1");
    let result = conn.query_row(&q, [username], User::from_row);
    match result {
        Ok(u) => Ok(Some(u)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// True if at least one admin account exists (excluding the seeded
/// anonymous user, which has a disabled password).
pub fn admin_exists(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM users WHERE role = 'admin' AND password_hash != '!disabled'",
            [],
            |row| row.get(0),
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(count > 0)
}

/// List all users ordered by username.
pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    let q = format!("SELECT {COLS} FROM users ORDER BY username ASC");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], User::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Update a user's password hash.
pub fn update_password(conn: &Connection, id: UserId, password_hash: &str) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE users SET password_hash = ?1 WHERE id = ?2",
            rusqlite::params![password_hash, id.to_string()],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Delete a user by ID. Returns true if a row was deleted.
pub fn delete_user(conn: &Connection, id: UserId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM users WHERE id = ?1", [id.to_string()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;

    #[test]
    fn create_and_get() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let u = create_user(&conn, "alice", "hash", "Alice Doe", "admin").unwrap();
        assert_eq!(u.username, "alice");
        assert!(u.is_admin());

        let found = get_user_by_id(&conn, u.id).unwrap().unwrap();
        assert_eq!(found.display_name, "Alice Doe");
    }

    #[test]
    fn get_by_username() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        create_user(&conn, "bob", "hash", "Bob", "student").unwrap();
        let found = get_user_by_username(&conn, "bob").unwrap();
        assert!(found.is_some());
        assert!(!found.unwrap().is_admin());
    }

    #[test]
    fn duplicate_username_conflicts() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        create_user(&conn, "dup", "h1", "D", "student").unwrap();
        let err = create_user(&conn, "dup", "h2", "D", "student").unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn admin_exists_ignores_anonymous() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        // Only the seeded anonymous admin is present.
        assert!(!admin_exists(&conn).unwrap());

        create_user(&conn, "root", "h", "Root", "admin").unwrap();
        assert!(admin_exists(&conn).unwrap());
    }

    #[test]
    fn delete() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let u = create_user(&conn, "del", "h", "Del", "student").unwrap();
        assert!(delete_user(&conn, u.id).unwrap());
        assert!(get_user_by_id(&conn, u.id).unwrap().is_none());
    }
}
