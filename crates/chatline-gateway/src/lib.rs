//! Session protocol and routing core of the chatline relay.

pub mod acceptor;
pub mod dispatcher;
pub mod error;
pub mod session;

pub use acceptor::{Acceptor, AdmissionPolicy};
pub use dispatcher::{Command, Dispatcher};
pub use error::{AcceptError, SessionError};
pub use session::{Session, SessionSummary};
