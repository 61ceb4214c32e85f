//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use huddle_shared::constants::DEFAULT_HTTP_PORT;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP/WebSocket (axum) server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// Explicit path for the SQLite database file. When unset, the store
    /// picks the platform-appropriate data directory.
    /// Env: `HUDDLE_DB_PATH`
    /// Default: unset
    pub db_path: Option<PathBuf>,

    /// Human-readable name for this server instance.
    /// Env: `INSTANCE_NAME`
    /// Default: `"Huddle Room"`
    pub instance_name: String,

    /// Static token directory, `token=Display Name` pairs separated by
    /// commas. Stands in for the external auth service in development.
    /// Env: `HUDDLE_TOKENS`
    /// Default: empty (no one can authenticate until tokens are provided).
    pub tokens: Vec<(String, String)>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            db_path: None,
            instance_name: "Huddle Room".to_string(),
            tokens: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(
                    value = %addr,
                    "Invalid HTTP_ADDR, using default"
                );
            }
        }

        if let Ok(path) = std::env::var("HUDDLE_DB_PATH") {
            if !path.is_empty() {
                config.db_path = Some(PathBuf::from(path));
            }
        }

        if let Ok(name) = std::env::var("INSTANCE_NAME") {
            config.instance_name = name;
        }

        if let Ok(raw) = std::env::var("HUDDLE_TOKENS") {
            config.tokens = parse_token_pairs(&raw);
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

/// Parse `token=Display Name` pairs separated by commas. Malformed entries
/// are skipped with a warning.
fn parse_token_pairs(raw: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    for entry in raw.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        match entry.split_once('=') {
            Some((token, name)) if !token.trim().is_empty() && !name.trim().is_empty() => {
                pairs.push((token.trim().to_string(), name.trim().to_string()));
            }
            _ => {
                tracing::warn!(entry = %entry, "Skipping malformed HUDDLE_TOKENS entry");
            }
        }
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert!(config.db_path.is_none());
        assert!(config.tokens.is_empty());
    }

    #[test]
    fn test_parse_token_pairs() {
        let pairs = parse_token_pairs("abc=Ada Lovelace, def=Grace Hopper");
        assert_eq!(
            pairs,
            vec![
                ("abc".to_string(), "Ada Lovelace".to_string()),
                ("def".to_string(), "Grace Hopper".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_token_pairs_skips_malformed() {
        let pairs = parse_token_pairs("ok=Fine,,broken,=NoToken,notext=");
        assert_eq!(pairs, vec![("ok".to_string(), "Fine".to_string())]);
    }
}
