use chatline_types::models::{ChatMessage, User};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("database lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("user not found: {0}")]
    UserNotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage capability consumed by the routing core.
///
/// Implementations must tolerate calls from several sessions at once.
pub trait ChatStore: Send + Sync {
    /// Inserts the user, or refreshes its status if the name is taken.
    fn save_user(&self, user: &User) -> StoreResult<()>;

    fn delete_user(&self, username: &str) -> StoreResult<()>;

    fn delete_all_users(&self) -> StoreResult<()>;

    /// Usernames in registration order.
    fn get_all_users(&self) -> StoreResult<Vec<String>>;

    fn rename_user(&self, username: &str, new_username: &str) -> StoreResult<()>;

    fn user_exists(&self, username: &str) -> StoreResult<bool>;

    /// Messages sent or received by `username`, in storage order.
    fn get_history(&self, username: &str) -> StoreResult<Vec<ChatMessage>>;

    /// Rejects messages with an empty sender.
    fn save_msg(&self, msg: &ChatMessage) -> StoreResult<()>;

    /// Removes every message sent from `msg.sender` to `msg.recipient`.
    fn delete_msg(&self, msg: &ChatMessage) -> StoreResult<()>;
}
