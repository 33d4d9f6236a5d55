//! Command line / environment configuration shared by the binaries

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_DB_PATH: &str = "data/referral.db";

#[derive(Parser, Debug, Clone)]
#[command(name = "api_server")]
#[command(about = "REST server for ZIP referral lookups and map edits")]
pub struct ServerConfig {
    /// Port to listen on
    #[arg(long, env = "ZIP_REFERRAL_PORT", default_value = "8080")]
    pub port: u16,

    /// Path to the SurrealDB database
    #[arg(long, env = "ZIP_REFERRAL_DB_PATH", default_value = DEFAULT_DB_PATH)]
    pub db_path: String,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Install the global tracing subscriber. RUST_LOG takes precedence over
/// `default_level`.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let config = ServerConfig::try_parse_from(["api_server"]).unwrap();
        assert_eq!(config.log_level, "info");
        assert!(!config.db_path.is_empty());
    }

    #[test]
    fn test_server_overrides() {
        let config = ServerConfig::try_parse_from([
            "api_server",
            "--port",
            "9000",
            "--db-path",
            "/tmp/referral.db",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.db_path, "/tmp/referral.db");
        assert_eq!(config.log_level, "debug");
    }
}
