mod config;

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use chatline_db::Database;
use chatline_gateway::{Acceptor, AdmissionPolicy, Dispatcher};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "chatline_server=debug,chatline_gateway=debug,chatline_db=info".into()
            }),
        )
        .init();

    let config = Config::parse();

    let db = Database::open(&config.db_path)?;
    let dispatcher = Dispatcher::new(Arc::new(db));

    let addr = config.listen_addr().await?;
    let acceptor = Acceptor::bind(addr, dispatcher, config.admission)?;
    info!("Chatline server listening on {}", acceptor.local_addr()?);

    if config.admission == AdmissionPolicy::Serialized {
        warn!("Serialized admission: one session at a time, and a failed session stops the server");
    }

    tokio::select! {
        result = acceptor.run() => result?,
        _ = shutdown_signal() => {}
    }

    info!("Chatline server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    info!("Received Ctrl+C, shutting down...");
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
