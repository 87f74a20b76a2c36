use rusqlite::{ffi, params, Connection, OptionalExtension};

use super::DatabaseError;

/// Row of the `users` table, including the stored password hash.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub password_hash: String,
}

/// Insert a user. A taken username surfaces as `DatabaseError::Duplicate`.
pub fn insert_user(
    conn: &Connection,
    name: &str,
    username: &str,
    password_hash: &str,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO users (name, username, password) VALUES (?1, ?2, ?3)",
        params![name, username, password_hash],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            DatabaseError::Duplicate("username".into())
        }
        other => DatabaseError::Sqlite(other),
    })?;
    Ok(conn.last_insert_rowid())
}

pub fn get_user_by_username(
    conn: &Connection,
    username: &str,
) -> Result<Option<UserRow>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, username, password FROM users WHERE username = ?1",
            params![username],
            |row| {
                Ok(UserRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    username: row.get(2)?,
                    password_hash: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}
