//! One accepted connection, from accept to close.
//!
//! A session is `Accepted` when constructed and `Reading` once [`Session::run`]
//! starts. It ends `Terminated` (the client closed its side, `Ok`) or `Failed`
//! (malformed line or I/O error, `Err`). Every line read produces exactly one
//! line written; a bad line is never skipped.

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Framed, LinesCodec};
use tracing::info;
use uuid::Uuid;

use chatline_types::wire::MAX_LINE_BYTES;

use crate::dispatcher::Dispatcher;
use crate::error::SessionError;

/// How a cleanly terminated session went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub lines_handled: u64,
}

pub struct Session<S> {
    id: Uuid,
    stream: S,
    dispatcher: Dispatcher,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, dispatcher: Dispatcher) -> Self {
        Self {
            id: Uuid::new_v4(),
            stream,
            dispatcher,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Reads lines until end of stream. The stream is dropped on every exit
    /// path, which closes the connection.
    pub async fn run(self) -> Result<SessionSummary, SessionError> {
        let Self {
            id,
            stream,
            dispatcher,
        } = self;

        let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_BYTES));
        let mut lines_handled: u64 = 0;

        while let Some(frame) = framed.next().await {
            let line = frame?;

            // SQLite calls block; keep them off the reactor.
            let worker = dispatcher.clone();
            let response = tokio::task::spawn_blocking(move || worker.dispatch_line(&line))
                .await??;

            framed.send(response).await?;
            lines_handled += 1;
        }

        info!("Session {} reached end of stream after {} lines", id, lines_handled);
        Ok(SessionSummary { lines_handled })
    }
}
