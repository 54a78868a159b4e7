//! Server configuration, built from environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;

/// Runtime settings for the onboarding server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Path of the libSQL database file.
    pub db_path: PathBuf,
    /// Install the default pages when the page table is empty.
    pub seed_default_pages: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            db_path: PathBuf::from("./data/onboarding.db"),
            seed_default_pages: true,
        }
    }
}

impl ServerConfig {
    /// Build config from `ONBOARDING_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup; unset keys take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = lookup("ONBOARDING_HOST").unwrap_or(defaults.host);
        let port = parse_var(&lookup, "ONBOARDING_PORT")?.unwrap_or(defaults.port);
        let db_path = lookup("ONBOARDING_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);
        let seed_default_pages = match lookup("ONBOARDING_SEED") {
            Some(raw) => parse_bool("ONBOARDING_SEED", &raw)?,
            None => defaults.seed_default_pages,
        };

        Ok(Self {
            host,
            port,
            db_path,
            seed_default_pages,
        })
    }

    /// `host:port` string for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{raw}: {e}"),
            })
        })
        .transpose()
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got {raw}"),
        }),
    }
}
