//! User accounts backed by the `users` table.
//!
//! Registration stores a salted PBKDF2 hash; authentication reports a
//! missing user and a wrong password as the same error kind.

pub mod password;

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::db::{self, users, DatabaseError};

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Username already exists: {0}")]
    UsernameTaken(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Missing or empty field: {0}")]
    InvalidInput(&'static str),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// A registered user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub username: String,
}

impl From<users::UserRow> for Account {
    fn from(row: users::UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            username: row.username,
        }
    }
}

/// Opens a short-lived connection per operation, so the store is cheap to
/// share across blocking tasks.
#[derive(Debug, Clone)]
pub struct AccountStore {
    db_path: PathBuf,
    hash_rounds: u32,
}

impl AccountStore {
    /// Create the database if needed and run migrations.
    pub fn open(db_path: &Path, hash_rounds: u32) -> Result<Self, AccountError> {
        db::open_database(db_path)?;
        tracing::info!(path = %db_path.display(), "Account store ready");
        Ok(Self {
            db_path: db_path.to_path_buf(),
            hash_rounds,
        })
    }

    pub fn register(
        &self,
        name: &str,
        username: &str,
        password: &str,
    ) -> Result<Account, AccountError> {
        let name = name.trim();
        let username = username.trim();
        if name.is_empty() {
            return Err(AccountError::InvalidInput("name"));
        }
        if username.is_empty() {
            return Err(AccountError::InvalidInput("username"));
        }
        if password.is_empty() {
            return Err(AccountError::InvalidInput("password"));
        }

        let hash = password::hash_password(password, self.hash_rounds)?;
        let conn = db::open_connection(&self.db_path)?;
        let id = users::insert_user(&conn, name, username, &hash).map_err(|e| match e {
            DatabaseError::Duplicate(_) => AccountError::UsernameTaken(username.to_string()),
            other => AccountError::Database(other),
        })?;

        tracing::info!(user_id = id, "Account registered");
        Ok(Account {
            id,
            name: name.to_string(),
            username: username.to_string(),
        })
    }

    pub fn authenticate(&self, username: &str, password: &str) -> Result<Account, AccountError> {
        let username = username.trim();
        let conn = db::open_connection(&self.db_path)?;
        let Some(row) = users::get_user_by_username(&conn, username)? else {
            tracing::debug!("Login rejected: unknown username");
            return Err(AccountError::InvalidCredentials);
        };

        match password::verify_password(password, &row.password_hash) {
            Ok(true) => Ok(row.into()),
            Ok(false) => {
                tracing::debug!(user_id = row.id, "Login rejected: password mismatch");
                Err(AccountError::InvalidCredentials)
            }
            Err(e) => {
                tracing::warn!(user_id = row.id, error = %e, "Stored password hash is malformed");
                Err(AccountError::InvalidCredentials)
            }
        }
    }

    /// Connectivity check for the health endpoint.
    pub fn ping(&self) -> Result<(), AccountError> {
        let conn = db::open_connection(&self.db_path)?;
        db::ping(&conn)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const TEST_ROUNDS: u32 = 1_000;

    pub(crate) fn temp_store() -> (tempfile::TempDir, AccountStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = AccountStore::open(&dir.path().join("users.db"), TEST_ROUNDS).unwrap();
        (dir, store)
    }

    #[test]
    fn register_then_authenticate() {
        let (_dir, store) = temp_store();
        let created = store.register("Asha Rao", "asha", "s3cret").unwrap();
        let account = store.authenticate("asha", "s3cret").unwrap();
        assert_eq!(created, account);
        assert_eq!(account.name, "Asha Rao");
    }

    #[test]
    fn duplicate_registration_keeps_one_row() {
        let (dir, store) = temp_store();
        store.register("First", "ops", "pw1").unwrap();
        let err = store.register("Second", "ops", "pw2").unwrap_err();
        assert!(matches!(err, AccountError::UsernameTaken(ref u) if u == "ops"));

        let conn = db::open_connection(&dir.path().join("users.db")).unwrap();
        assert_eq!(users::tests::count_users_named(&conn, "ops"), 1);
        // The original password still works.
        assert!(store.authenticate("ops", "pw1").is_ok());
    }

    #[test]
    fn unknown_user_and_wrong_password_fail_alike() {
        let (_dir, store) = temp_store();
        store.register("Asha", "asha", "right").unwrap();

        let unknown = store.authenticate("nobody", "right").unwrap_err();
        let wrong = store.authenticate("asha", "wrong").unwrap_err();
        assert!(matches!(unknown, AccountError::InvalidCredentials));
        assert!(matches!(wrong, AccountError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[test]
    fn password_is_stored_hashed() {
        let (dir, store) = temp_store();
        store.register("Asha", "asha", "plaintext-pw").unwrap();
        let conn = db::open_connection(&dir.path().join("users.db")).unwrap();
        let row = users::get_user_by_username(&conn, "asha").unwrap().unwrap();
        assert_ne!(row.password_hash, "plaintext-pw");
        assert!(row.password_hash.starts_with("$pbkdf2-sha256$"));
    }

    #[test]
    fn malformed_stored_hash_counts_as_invalid_credentials() {
        let (dir, store) = temp_store();
        let conn = db::open_connection(&dir.path().join("users.db")).unwrap();
        users::insert_user(&conn, "Legacy", "legacy", "not-a-phc-string").unwrap();
        assert!(matches!(
            store.authenticate("legacy", "anything"),
            Err(AccountError::InvalidCredentials)
        ));
    }

    #[test]
    fn empty_fields_rejected() {
        let (_dir, store) = temp_store();
        assert!(matches!(
            store.register("", "u", "p"),
            Err(AccountError::InvalidInput("name"))
        ));
        assert!(matches!(
            store.register("N", "   ", "p"),
            Err(AccountError::InvalidInput("username"))
        ));
        assert!(matches!(
            store.register("N", "u", ""),
            Err(AccountError::InvalidInput("password"))
        ));
    }

    #[test]
    fn username_is_trimmed() {
        let (_dir, store) = temp_store();
        store.register("Asha", "  asha ", "pw").unwrap();
        assert!(store.authenticate("asha", "pw").is_ok());
    }

    #[test]
    fn ping_succeeds_on_open_store() {
        let (_dir, store) = temp_store();
        assert!(store.ping().is_ok());
    }
}
