//! Client side of the chatline line protocol.
//!
//! Every request opens its own connection, sends one line, reads the single
//! response line and disconnects.

use std::io;

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::debug;

use chatline_types::username::is_valid_username;
use chatline_types::wire::{self, LineError, UPDATE_COMMAND};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 7777;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid username {0:?}")]
    InvalidUsername(String),

    #[error("message rejected before sending: {0}")]
    InvalidMessage(#[from] LineError),

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("transport failure: {0}")]
    Transport(#[from] io::Error),

    #[error("server closed the connection without responding")]
    NoResponse,
}

impl From<LinesCodecError> for ClientError {
    fn from(err: LinesCodecError) -> Self {
        match err {
            LinesCodecError::MaxLineLengthExceeded => Self::Transport(io::Error::new(
                io::ErrorKind::InvalidData,
                "response line too long",
            )),
            LinesCodecError::Io(e) => Self::Transport(e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatClient {
    username: String,
    host: String,
    port: u16,
}

impl ChatClient {
    /// Fails if `username` breaks the username rules.
    pub fn new(
        username: impl Into<String>,
        host: impl Into<String>,
        port: u16,
    ) -> Result<Self, ClientError> {
        let username = username.into();
        if !is_valid_username(&username) {
            return Err(ClientError::InvalidUsername(username));
        }

        Ok(Self {
            username,
            host: host.into(),
            port,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Sends `message` and returns the raw response line.
    ///
    /// Lines the server would reject are refused locally, since a rejected
    /// line ends the server's current session.
    pub async fn send(&self, message: &str) -> Result<String, ClientError> {
        let line = wire::encode_request(&self.username, message);
        wire::validate_request(&line)?;

        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|source| ClientError::Connect {
                addr: format!("{}:{}", self.host, self.port),
                source,
            })?;

        let mut framed = Framed::new(stream, LinesCodec::new());
        framed.send(line).await?;
        debug!("Sent request to {}:{}", self.host, self.port);

        match framed.next().await {
            Some(response) => Ok(response?),
            None => Err(ClientError::NoResponse),
        }
    }

    /// Fetches this user's history.
    pub async fn update(&self) -> Result<String, ClientError> {
        self.send(UPDATE_COMMAND).await
    }
}

/// Display form of a response line: a cursor, then one record per line.
pub fn render(response: &str) -> String {
    format!("> {}", wire::expand_response(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_usernames() {
        for name in ["_bad", "a..b", "ab"] {
            assert!(matches!(
                ChatClient::new(name, DEFAULT_HOST, DEFAULT_PORT),
                Err(ClientError::InvalidUsername(_))
            ));
        }
        let client = ChatClient::new("alice", DEFAULT_HOST, DEFAULT_PORT).unwrap();
        assert_eq!(client.username(), "alice");
    }

    #[tokio::test]
    async fn oversized_message_never_leaves_the_client() {
        // Port 9 (discard) is never contacted because validation fails first.
        let client = ChatClient::new("alice", DEFAULT_HOST, 9).unwrap();
        let err = client.send(&"x".repeat(294)).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::InvalidMessage(LineError::TooLong { len: 300 })
        ));
    }

    #[tokio::test]
    async fn message_with_line_break_never_leaves_the_client() {
        let client = ChatClient::new("alice", DEFAULT_HOST, 9).unwrap();
        for message in ["hi\nthere", "hi\rthere"] {
            let err = client.send(message).await.unwrap_err();
            assert!(matches!(
                err,
                ClientError::InvalidMessage(LineError::LineBreak)
            ));
        }
    }

    #[tokio::test]
    async fn connects_to_ipv6_host() {
        let listener = tokio::net::TcpListener::bind("[::1]:0").await;
        // Skip on hosts without IPv6 loopback.
        let Ok(listener) = listener else { return };
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut framed = Framed::new(stream, LinesCodec::new());
            let request = framed.next().await.unwrap().unwrap();
            framed.send(format!("echo {request}")).await.unwrap();
        });

        let client = ChatClient::new("alice", "::1", port).unwrap();
        assert_eq!(client.send("hi").await.unwrap(), "echo alice hi");
        server.await.unwrap();
    }

    #[test]
    fn render_expands_records() {
        assert_eq!(render(""), "> ");
        assert_eq!(
            render("sender: a recipient: b hi#sender: b recipient: a yo#"),
            "> sender: a recipient: b hi\nsender: b recipient: a yo\n"
        );
    }
}
