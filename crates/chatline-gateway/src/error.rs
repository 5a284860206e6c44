use std::io;

use chatline_types::wire::{LineError, MAX_LINE_BYTES};
use thiserror::Error;
use tokio::task::JoinError;
use tokio_util::codec::LinesCodecError;

/// Why a session ended in the failed state.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("malformed line: {0}")]
    MalformedLine(#[from] LineError),

    #[error("transport failure: {0}")]
    Transport(#[from] io::Error),

    #[error("dispatch worker failed: {0}")]
    Worker(#[from] JoinError),
}

impl From<LinesCodecError> for SessionError {
    fn from(err: LinesCodecError) -> Self {
        match err {
            LinesCodecError::MaxLineLengthExceeded => Self::MalformedLine(LineError::Oversized {
                limit: MAX_LINE_BYTES,
            }),
            LinesCodecError::Io(e) => Self::Transport(e),
        }
    }
}

/// Why the acceptor loop stopped.
#[derive(Debug, Error)]
pub enum AcceptError {
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    #[error("session failed: {0}")]
    Session(#[from] SessionError),

    #[error("session worker panicked: {0}")]
    Worker(#[from] JoinError),
}
