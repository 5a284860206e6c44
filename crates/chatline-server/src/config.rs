use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use chatline_gateway::AdmissionPolicy;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 7777;

/// Chatline relay server.
///
/// Every option can also come from the environment (or a `.env` file).
/// Positional arguments win over the environment.
#[derive(Parser, Debug)]
#[command(name = "chatline")]
pub struct Config {
    /// Address to listen on.
    #[arg(value_name = "HOST", env = "CHATLINE_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on.
    #[arg(value_name = "PORT", env = "CHATLINE_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// SQLite database file.
    #[arg(long, env = "CHATLINE_DB_PATH", default_value = "chatline.db")]
    pub db_path: PathBuf,

    /// `serialized` (one session at a time) or `concurrent`.
    #[arg(long, env = "CHATLINE_ADMISSION", default_value_t = AdmissionPolicy::Serialized)]
    pub admission: AdmissionPolicy,
}

impl Config {
    /// Resolves `host:port`, which may name a host rather than an IP.
    pub async fn listen_addr(&self) -> Result<SocketAddr> {
        tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .with_context(|| format!("failed to resolve {}:{}", self.host, self.port))?
            .next()
            .with_context(|| format!("{} resolved to no addresses", self.host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_endpoint_and_flags() {
        let config = Config::try_parse_from([
            "chatline",
            "0.0.0.0",
            "9000",
            "--db-path",
            "/tmp/chat.db",
            "--admission",
            "concurrent",
        ])
        .unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.db_path, PathBuf::from("/tmp/chat.db"));
        assert_eq!(config.admission, AdmissionPolicy::Concurrent);
    }

    #[test]
    fn rejects_bad_port_and_policy() {
        assert!(Config::try_parse_from(["chatline", "localhost", "seventy"]).is_err());
        assert!(
            Config::try_parse_from(["chatline", "localhost", "7777", "--admission", "maybe"])
                .is_err()
        );
        assert!(Config::try_parse_from(["chatline", "a", "1", "extra"]).is_err());
    }

    #[tokio::test]
    async fn resolves_loopback() {
        let config = Config::try_parse_from(["chatline", "127.0.0.1", "7777"]).unwrap();
        let addr = config.listen_addr().await.unwrap();
        assert_eq!(addr, "127.0.0.1:7777".parse::<SocketAddr>().unwrap());
    }
}
