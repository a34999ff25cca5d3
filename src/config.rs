//! Configuration management for Bookmark Sync Server

use serde::Deserialize;
use std::env;
use thiserror::Error;

use crate::sync::{MergeStrategy, MetaStrategy, TagStrategy, DEFAULT_DATE};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Strategy used when a sync request does not bring its own
    pub default_strategy: MergeStrategy,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: "sqlite:./bookmarks.db".to_string(),
            },
            sync: SyncConfig {
                default_strategy: MergeStrategy {
                    default_date: DEFAULT_DATE,
                    ..MergeStrategy::default()
                },
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("SERVER_PORT", 3000)?,
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./bookmarks.db".to_string()),
            },
            sync: SyncConfig {
                default_strategy: MergeStrategy {
                    meta: env::var("SYNC_META_STRATEGY")
                        .map(|v| MetaStrategy::from_name(&v))
                        .unwrap_or_default(),
                    tags: env::var("SYNC_TAGS_STRATEGY")
                        .map(|v| TagStrategy::from_name(&v))
                        .unwrap_or_default(),
                    default_date: parse_var("SYNC_DEFAULT_DATE", DEFAULT_DATE)?,
                    prefer_oldest_created: parse_var("SYNC_PREFER_OLDEST_CREATED", true)?,
                    prefer_newest_updated: parse_var("SYNC_PREFER_NEWEST_UPDATED", true)?,
                },
            },
        })
    }

    /// Address the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Read and parse an environment variable, using `default` when unset
fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        Err(_) => Ok(default),
    }
}
