use std::fmt;

/// Presence of a user as last recorded by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStatus {
    Online,
    Offline,
}

impl UserStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "ONLINE",
            Self::Offline => "OFFLINE",
        }
    }

    /// Parses the stored column value. Unknown values read as offline.
    pub fn from_db(value: &str) -> Self {
        if value.eq_ignore_ascii_case("ONLINE") {
            Self::Online
        } else {
            Self::Offline
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub status: UserStatus,
}

impl User {
    pub fn online(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            status: UserStatus::Online,
        }
    }
}

/// A single stored message. Broadcasts are stored as one record per recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: String,
    pub recipient: String,
    pub body: String,
}

impl ChatMessage {
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            body: body.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_column_round_trip() {
        assert_eq!(UserStatus::from_db(UserStatus::Online.as_str()), UserStatus::Online);
        assert_eq!(UserStatus::from_db(UserStatus::Offline.as_str()), UserStatus::Offline);
        assert_eq!(UserStatus::from_db("online"), UserStatus::Online);
        assert_eq!(UserStatus::from_db("away"), UserStatus::Offline);
    }
}
