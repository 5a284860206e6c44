use std::sync::Arc;

use tracing::{debug, warn};

use chatline_db::ChatStore;
use chatline_types::models::{ChatMessage, User};
use chatline_types::wire::{
    self, FIELD_SEPARATOR, LineError, NO_SUCH_USER, PRIVATE_PREFIX, UPDATE_COMMAND,
};

/// What a decoded message asks the relay to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// Replay every message the sender sent or received.
    History,
    /// `@recipient payload`
    Private { recipient: &'a str, body: &'a str },
    /// Everything else goes to every other known user.
    Broadcast { body: &'a str },
}

impl<'a> Command<'a> {
    pub fn classify(message: &'a str) -> Self {
        if message.eq_ignore_ascii_case(UPDATE_COMMAND) {
            return Self::History;
        }

        if let Some(rest) = message.strip_prefix(PRIVATE_PREFIX) {
            let (recipient, body) = rest.split_once(FIELD_SEPARATOR).unwrap_or((rest, ""));
            return Self::Private {
                recipient: recipient.trim(),
                body: body.trim(),
            };
        }

        Self::Broadcast { body: message }
    }
}

/// Routes decoded lines to storage. Cheap to clone; every clone shares the
/// same store.
///
/// Storage failures never reach the client: they are logged and the request
/// degrades (dropped message, empty history).
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn ChatStore>,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self { store }
    }

    /// Decodes and dispatches one raw line, returning the response line.
    pub fn dispatch_line(&self, line: &str) -> Result<String, LineError> {
        let decoded = wire::decode_line(line)?;
        Ok(self.dispatch(decoded.username, decoded.message))
    }

    /// Runs one request from `sender`. Returns the history text for history
    /// requests and an empty string otherwise.
    pub fn dispatch(&self, sender: &str, message: &str) -> String {
        debug!("{} > {}", sender, message);

        self.ensure_user(sender);

        match Command::classify(message) {
            Command::History => self.history(sender),
            Command::Private { recipient, body } => {
                self.send_private(sender, recipient, body);
                String::new()
            }
            Command::Broadcast { body } => {
                self.broadcast(sender, body);
                String::new()
            }
        }
    }

    /// Makes sure the sender is a known, online user. The upsert also
    /// refreshes the status of users already stored. Never fails.
    fn ensure_user(&self, username: &str) {
        if let Err(e) = self.store.save_user(&User::online(username)) {
            warn!("Failed to save user {}: {}", username, e);
        }
    }

    fn history(&self, username: &str) -> String {
        match self.store.get_history(username) {
            Ok(records) => wire::encode_history(&records),
            Err(e) => {
                warn!("Failed to load history for {}: {}", username, e);
                String::new()
            }
        }
    }

    fn send_private(&self, sender: &str, recipient: &str, body: &str) {
        let exists = self.store.user_exists(recipient).unwrap_or_else(|e| {
            warn!("Failed to look up recipient {}: {}", recipient, e);
            false
        });

        let body = if exists {
            body
        } else {
            debug!("{} wrote to unknown user {:?}", sender, recipient);
            NO_SUCH_USER
        };

        self.save(&ChatMessage::new(sender, recipient, body));
    }

    fn broadcast(&self, sender: &str, body: &str) {
        let usernames = match self.store.get_all_users() {
            Ok(names) => names,
            Err(e) => {
                warn!("Failed to list users, dropping broadcast from {}: {}", sender, e);
                return;
            }
        };

        for username in usernames
            .iter()
            .filter(|name| !name.eq_ignore_ascii_case(sender))
        {
            self.save(&ChatMessage::new(sender, username.as_str(), body));
        }
    }

    fn save(&self, msg: &ChatMessage) {
        if let Err(e) = self.store.save_msg(msg) {
            warn!(
                "Failed to save message {} -> {}: {}",
                msg.sender, msg.recipient, e
            );
        }
    }
}
