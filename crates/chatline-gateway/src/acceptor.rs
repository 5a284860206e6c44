//! Listening endpoint and admission policy.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::str::FromStr;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::{TcpListener, TcpStream};
use tracing::{Instrument, error, info, info_span, warn};

use crate::dispatcher::Dispatcher;
use crate::error::{AcceptError, SessionError};
use crate::session::Session;

const LISTEN_BACKLOG: i32 = 128;

/// How many sessions may run at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AdmissionPolicy {
    /// One session at a time: the next connection is accepted only after the
    /// current session ends. A failed session stops the acceptor.
    #[default]
    Serialized,
    /// One task per connection. Failures are logged and contained.
    Concurrent,
}

impl FromStr for AdmissionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "serialized" | "serial" => Ok(Self::Serialized),
            "concurrent" => Ok(Self::Concurrent),
            other => Err(format!(
                "unknown admission policy {other:?}, expected \"serialized\" or \"concurrent\""
            )),
        }
    }
}

impl fmt::Display for AdmissionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serialized => f.write_str("serialized"),
            Self::Concurrent => f.write_str("concurrent"),
        }
    }
}

pub struct Acceptor {
    listener: TcpListener,
    dispatcher: Dispatcher,
    policy: AdmissionPolicy,
}

impl Acceptor {
    /// Binds `addr` with `SO_REUSEADDR` so a restarted server can reuse the
    /// port immediately. Must be called inside a tokio runtime.
    pub fn bind(
        addr: SocketAddr,
        dispatcher: Dispatcher,
        policy: AdmissionPolicy,
    ) -> io::Result<Self> {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(true)?;
        socket.set_nonblocking(true)?;
        socket.bind(&addr.into())?;
        socket.listen(LISTEN_BACKLOG)?;

        let listener = TcpListener::from_std(socket.into())?;
        Ok(Self::from_listener(listener, dispatcher, policy))
    }

    pub fn from_listener(
        listener: TcpListener,
        dispatcher: Dispatcher,
        policy: AdmissionPolicy,
    ) -> Self {
        Self {
            listener,
            dispatcher,
            policy,
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn policy(&self) -> AdmissionPolicy {
        self.policy
    }

    /// Accepts connections until a fatal error. Under
    /// [`AdmissionPolicy::Concurrent`] this only returns if the task is
    /// cancelled.
    pub async fn run(self) -> Result<(), AcceptError> {
        info!(
            "Accepting connections on {} ({} admission)",
            self.local_addr().map_err(AcceptError::Accept)?,
            self.policy
        );

        match self.policy {
            AdmissionPolicy::Serialized => self.run_serialized().await,
            AdmissionPolicy::Concurrent => {
                self.run_concurrent().await;
                Ok(())
            }
        }
    }

    async fn run_serialized(self) -> Result<(), AcceptError> {
        loop {
            let (stream, addr) = self.listener.accept().await.map_err(|e| {
                error!("Accept error, no longer accepting: {}", e);
                AcceptError::Accept(e)
            })?;

            info!("New connection from {}", addr);

            // The session gets its own task, but the next accept waits for it.
            let worker = tokio::spawn(serve(stream, addr, self.dispatcher.clone()));
            if let Err(e) = worker.await? {
                error!("Session with {} failed, no longer accepting: {}", addr, e);
                return Err(e.into());
            }
        }
    }

    async fn run_concurrent(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    info!("New connection from {}", addr);
                    let dispatcher = self.dispatcher.clone();
                    tokio::spawn(async move {
                        if let Err(e) = serve(stream, addr, dispatcher).await {
                            warn!("Session with {} failed: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

async fn serve(
    stream: TcpStream,
    addr: SocketAddr,
    dispatcher: Dispatcher,
) -> Result<(), SessionError> {
    stream.set_nodelay(true)?;

    let session = Session::new(stream, dispatcher);
    let span = info_span!("session", id = %session.id(), peer = %addr);
    session.run().instrument(span).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_parsing() {
        assert_eq!("serialized".parse::<AdmissionPolicy>(), Ok(AdmissionPolicy::Serialized));
        assert_eq!(" Concurrent ".parse::<AdmissionPolicy>(), Ok(AdmissionPolicy::Concurrent));
        assert!("parallel".parse::<AdmissionPolicy>().is_err());
        assert_eq!(AdmissionPolicy::default(), AdmissionPolicy::Serialized);
    }

    #[test]
    fn policy_display_parses_back() {
        for policy in [AdmissionPolicy::Serialized, AdmissionPolicy::Concurrent] {
            assert_eq!(policy.to_string().parse::<AdmissionPolicy>(), Ok(policy));
        }
    }
}
