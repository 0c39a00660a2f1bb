//! Login account operations

use anyhow::{Context, Result};
use rusqlite::{OptionalExtension, params};
use tracing::debug;

use super::database::{Database, now};
use super::models::{User, UserCredentials};

impl Database {
    /// Insert a user with an already hashed password
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        let conn = self.lock();
        let created_at = now();

        conn.execute(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
            params![username, password_hash, created_at],
        )
        .with_context(|| format!("Failed to create user '{}'", username))?;

        let id = conn.last_insert_rowid();
        debug!(user_id = id, username = %username, "User created");

        Ok(User {
            id,
            username: username.to_string(),
            created_at,
        })
    }

    /// Look up a user and its password hash by login name
    pub fn find_credentials(&self, username: &str) -> Result<Option<UserCredentials>> {
        let conn = self.lock();
        conn.query_row(
            "SELECT id, username, created_at, password_hash FROM users WHERE username = ?1",
            [username],
            |row| {
                Ok(UserCredentials {
                    user: User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        created_at: row.get(2)?,
                    },
                    password_hash: row.get(3)?,
                })
            },
        )
        .optional()
        .context("Failed to query user credentials")
    }

    /// Get a user by ID
    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.lock();
        conn.query_row(
            "SELECT id, username, created_at FROM users WHERE id = ?1",
            [id],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    created_at: row.get(2)?,
                })
            },
        )
        .optional()
        .context("Failed to query user")
    }

    /// List users ordered by login name (assessor choices)
    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT id, username, created_at FROM users ORDER BY username")?;
        let users = stmt
            .query_map([], |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to collect user rows")?;
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_find_user() {
        let db = Database::new(":memory:").expect("Failed to create database");
        let user = db.create_user("alice", "$argon2id$hash").expect("create");

        let found = db
            .find_credentials("alice")
            .expect("query")
            .expect("user exists");
        assert_eq!(found.user.id, user.id);
        assert_eq!(found.password_hash, "$argon2id$hash");

        assert!(db.find_credentials("bob").expect("query").is_none());
        assert_eq!(db.get_user(user.id).expect("query").map(|u| u.username), Some("alice".to_string()));
    }

    #[test]
    fn test_duplicate_username_fails() {
        let db = Database::new(":memory:").expect("Failed to create database");
        db.create_user("alice", "h1").expect("create");
        assert!(db.create_user("alice", "h2").is_err());
    }

    #[test]
    fn test_list_users_sorted() {
        let db = Database::new(":memory:").expect("Failed to create database");
        db.create_user("zoe", "h").expect("create");
        db.create_user("adam", "h").expect("create");

        let names: Vec<String> = db
            .list_users()
            .expect("list")
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["adam", "zoe"]);
    }
}
