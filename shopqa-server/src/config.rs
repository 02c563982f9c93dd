//! Environment configuration for the shopqa server.

use std::path::PathBuf;

use shopqa_data::DbConfig;
use shopqa_rag::DEFAULT_TOP_K;
use thiserror::Error;

/// Which record-source strategy the server runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataStrategy {
    /// Generated JSON snapshot on disk.
    Fixture,
    /// Live PostgreSQL store.
    Live,
}

/// A configuration validation error, reported at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {message}")]
    Invalid {
        name: &'static str,
        message: String,
    },
}

/// Server configuration, read once from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub strategy: DataStrategy,
    pub snapshot_path: PathBuf,
    pub db: DbConfig,
    pub deepseek_api_key: String,
    pub openai_api_key: String,
    /// Number of chunks retrieved per query.
    pub top_k: usize,
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Read configuration from process environment variables.
    ///
    /// `.env` loading (via `dotenvy`) is the caller's responsibility so
    /// this stays deterministic in tests.
    pub fn from_env() -> Result<Config, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
        let strategy = match get("SHOPQA_DATA_SOURCE").as_deref() {
            None | Some("fixture") => DataStrategy::Fixture,
            Some("live") => DataStrategy::Live,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "SHOPQA_DATA_SOURCE",
                    message: format!("expected 'fixture' or 'live', got '{other}'"),
                });
            }
        };

        let db = DbConfig {
            host: get("DB_HOST").unwrap_or_else(|| "localhost".into()),
            database: get("DB_NAME").unwrap_or_else(|| "ecommerce_db".into()),
            user: get("DB_USER").unwrap_or_default(),
            password: get("DB_PASSWORD").unwrap_or_default(),
            port: match get("DB_PORT") {
                Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                    name: "DB_PORT",
                    message: format!("'{raw}' is not a port number"),
                })?,
                None => 5432,
            },
        };

        let top_k = match get("SHOPQA_TOP_K") {
            Some(raw) => {
                let parsed: usize = raw.parse().map_err(|_| ConfigError::Invalid {
                    name: "SHOPQA_TOP_K",
                    message: format!("'{raw}' is not a number"),
                })?;
                if parsed == 0 {
                    return Err(ConfigError::Invalid {
                        name: "SHOPQA_TOP_K",
                        message: "must be greater than zero".into(),
                    });
                }
                parsed
            }
            None => DEFAULT_TOP_K,
        };

        let port = match get("SHOPQA_PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "SHOPQA_PORT",
                message: format!("'{raw}' is not a port number"),
            })?,
            None => 8080,
        };

        Ok(Config {
            strategy,
            snapshot_path: get("SHOPQA_SNAPSHOT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("ecommerce_data.json")),
            db,
            deepseek_api_key: get("DEEPSEEK_API_KEY")
                .ok_or(ConfigError::Missing("DEEPSEEK_API_KEY"))?,
            openai_api_key: get("OPENAI_API_KEY").ok_or(ConfigError::Missing("OPENAI_API_KEY"))?,
            top_k,
            host: get("SHOPQA_HOST").unwrap_or_else(|| "127.0.0.1".into()),
            port,
        })
    }
}
