use chatline_types::models::{ChatMessage, User, UserStatus};
use rusqlite::Connection;
use tracing::debug;

use crate::{ChatStore, Database, StoreError, StoreResult};

impl Database {
    /// Full user row, if present.
    pub fn get_user(&self, username: &str) -> StoreResult<Option<User>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT username, status FROM users WHERE username = ?1",
                [username],
                |row| {
                    let status: String = row.get(1)?;
                    Ok(User {
                        username: row.get(0)?,
                        status: UserStatus::from_db(&status),
                    })
                },
            )
            .optional()
        })
    }
}

impl ChatStore for Database {
    // -- Users --

    fn save_user(&self, user: &User) -> StoreResult<()> {
        if user.username.is_empty() {
            return Err(StoreError::InvalidInput("username is empty"));
        }

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, status) VALUES (?1, ?2)
                 ON CONFLICT(username) DO UPDATE SET status = excluded.status",
                (&user.username, user.status.as_str()),
            )?;
            Ok(())
        })
    }

    fn delete_user(&self, username: &str) -> StoreResult<()> {
        if username.is_empty() {
            return Err(StoreError::InvalidInput("username is empty"));
        }

        self.with_conn(|conn| {
            conn.execute("DELETE FROM users WHERE username = ?1", [username])?;
            Ok(())
        })
    }

    fn delete_all_users(&self) -> StoreResult<()> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM users", [])?;
            debug!("Removed {} users", removed);
            Ok(())
        })
    }

    fn get_all_users(&self) -> StoreResult<Vec<String>> {
        self.with_conn(query_usernames)
    }

    fn rename_user(&self, username: &str, new_username: &str) -> StoreResult<()> {
        if username.is_empty() {
            return Err(StoreError::InvalidInput("old username is empty"));
        }
        if new_username.is_empty() {
            return Err(StoreError::InvalidInput("new username is empty"));
        }

        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE users SET username = ?1 WHERE username = ?2",
                (new_username, username),
            )?;
            if updated == 0 {
                return Err(StoreError::UserNotFound(username.to_string()));
            }
            Ok(())
        })
    }

    fn user_exists(&self, username: &str) -> StoreResult<bool> {
        if username.is_empty() {
            return Ok(false);
        }

        self.with_conn(|conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
                [username],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    // -- Messages --

    fn get_history(&self, username: &str) -> StoreResult<Vec<ChatMessage>> {
        if username.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| query_history(conn, username))
    }

    fn save_msg(&self, msg: &ChatMessage) -> StoreResult<()> {
        if msg.sender.is_empty() {
            return Err(StoreError::InvalidInput("message has no sender"));
        }

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chat (sender, recipient, message) VALUES (?1, ?2, ?3)",
                (&msg.sender, &msg.recipient, &msg.body),
            )?;
            Ok(())
        })
    }

    fn delete_msg(&self, msg: &ChatMessage) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM chat WHERE sender = ?1 AND recipient = ?2",
                (&msg.sender, &msg.recipient),
            )?;
            Ok(())
        })
    }
}

fn query_usernames(conn: &Connection) -> StoreResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT username FROM users ORDER BY user_id")?;

    let rows = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;

    Ok(rows)
}

fn query_history(conn: &Connection, username: &str) -> StoreResult<Vec<ChatMessage>> {
    let mut stmt = conn.prepare(
        "SELECT sender, recipient, message
         FROM chat
         WHERE recipient = ?1 OR sender = ?1
         ORDER BY chat_id",
    )?;

    let rows = stmt
        .query_map([username], |row| {
            Ok(ChatMessage {
                sender: row.get(0)?,
                recipient: row.get(1)?,
                body: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> StoreResult<Option<T>>;
}

impl<T> OptionalExt<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> StoreResult<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
