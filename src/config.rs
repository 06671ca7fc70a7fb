use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "docsift";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default OpenAI-compatible chat completion endpoint (Groq).
pub const DEFAULT_CHAT_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    format!("info,{APP_NAME}=debug")
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

/// Server configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Base URL of the OCR Read API (e.g. an Azure Cognitive Services endpoint).
    pub ocr_endpoint: String,
    /// Subscription key sent as `Ocp-Apim-Subscription-Key`.
    pub ocr_api_key: String,
    /// OpenAI-compatible chat completion endpoint.
    pub chat_endpoint: String,
    /// Bearer token for the chat endpoint.
    pub chat_api_key: String,
    /// Port the HTTP server binds on.
    pub port: u16,
    /// Allowed CORS origin for the review UI. `None` means any origin.
    pub frontend_url: Option<String>,
    /// Data directory holding the databases and upload staging area.
    pub data_dir: PathBuf,
}

impl ServerConfig {
    /// Read configuration from the environment.
    ///
    /// Credentials are validated here so a misconfigured deployment fails at
    /// startup instead of on the first upload.
    pub fn from_env() -> Result<Self, ConfigError> {
        let ocr_endpoint = require_var("OCR_ENDPOINT")?;
        let ocr_api_key = require_var("OCR_API_KEY")?;
        let chat_api_key = require_var("CHAT_API_KEY")?;

        let chat_endpoint = std::env::var("CHAT_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_CHAT_ENDPOINT.to_string());

        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                var: "PORT",
                value: raw,
            })?,
            Err(_) => 5000,
        };

        let frontend_url = std::env::var("FRONTEND_URL").ok().filter(|s| !s.is_empty());

        let data_dir = std::env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_data_dir());

        Ok(Self {
            ocr_endpoint,
            ocr_api_key,
            chat_endpoint,
            chat_api_key,
            port,
            frontend_url,
            data_dir,
        })
    }

    /// Socket address the server binds on.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), self.port)
    }

    /// Path of the working (pre-verification) database.
    pub fn working_db_path(&self) -> PathBuf {
        self.data_dir.join("working.db")
    }

    /// Path of the verified database.
    pub fn verified_db_path(&self) -> PathBuf {
        self.data_dir.join("verified.db")
    }

    /// Directory where uploaded files are staged before processing.
    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }
}

fn require_var(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::MissingVar(name))
}

/// Default data directory: ~/docsift/
fn default_data_dir() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(APP_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ServerConfig {
        ServerConfig {
            ocr_endpoint: "https://ocr.example.com".into(),
            ocr_api_key: "key".into(),
            chat_endpoint: DEFAULT_CHAT_ENDPOINT.into(),
            chat_api_key: "key".into(),
            port: 5000,
            frontend_url: None,
            data_dir: PathBuf::from("/tmp/docsift-test"),
        }
    }

    #[test]
    fn derived_paths_under_data_dir() {
        let config = test_config();
        assert!(config.working_db_path().starts_with(&config.data_dir));
        assert!(config.verified_db_path().starts_with(&config.data_dir));
        assert!(config.uploads_dir().starts_with(&config.data_dir));
        assert_ne!(config.working_db_path(), config.verified_db_path());
    }

    #[test]
    fn bind_addr_uses_configured_port() {
        let config = test_config();
        assert_eq!(config.bind_addr().port(), 5000);
    }

    #[test]
    fn default_data_dir_under_home() {
        let dir = default_data_dir();
        if let Some(home) = dirs::home_dir() {
            assert!(dir.starts_with(home));
        }
        assert!(dir.ends_with(APP_NAME));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
