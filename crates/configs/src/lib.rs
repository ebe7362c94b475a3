//! # configs
//!
//! Runtime configuration for the Fomí client binaries. Values come from an
//! optional `fomi.toml` next to the working directory, overridden by
//! `FOMI__`-prefixed environment variables (a `.env` file is honored).
//!
//! The backend anon key is wrapped in [`secrecy::SecretString`] so it never
//! lands in debug output; adapters expose it only at header-build time.

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

/// Connection settings for the hosted backend.
#[derive(Debug, Deserialize)]
pub struct BackendSettings {
    /// Base URL of the backend project, e.g. `https://abc123.backend.app`.
    pub url: String,
    /// Publishable API key sent with every request.
    pub anon_key: SecretString,
}

#[derive(Debug, Deserialize)]
pub struct LogSettings {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `info,services=debug`.
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub backend: BackendSettings,
    #[serde(default)]
    pub log: LogSettings,
}

/// Loads configuration from `fomi.toml` (optional) and the environment.
///
/// Environment variables use `__` as the section separator:
/// `FOMI__BACKEND__URL`, `FOMI__BACKEND__ANON_KEY`, `FOMI__LOG__FILTER`.
pub fn load() -> Result<AppConfig, ConfigError> {
    // A missing .env file is fine; real deployments set variables directly.
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded environment from .env");
    }

    let settings = config::Config::builder()
        .add_source(config::File::with_name("fomi").required(false))
        .add_source(config::Environment::with_prefix("FOMI").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
