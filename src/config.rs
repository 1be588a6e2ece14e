//! Environment-driven service configuration.

use std::env;
use std::path::PathBuf;

use thiserror::Error;
use url::Url;

use crate::llm::models::DEFAULT_MODEL;
use crate::server::DEFAULT_PORT;

/// Default directory for conversation documents, relative to the working
/// directory.
pub const DEFAULT_DATA_DIR: &str = "conversations";

/// Configuration rejected by [`AppConfig::validate`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value is out of range or empty.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// The Ollama base URL does not parse.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Completion backend settings.
#[derive(Clone, Debug)]
pub struct LlmConfig {
    /// Model identifier sent with each completion request.
    pub model: String,
    /// Ollama base URL; `None` uses the provider default (local instance).
    pub base_url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
        }
    }
}

/// Top-level service configuration.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// TCP port the HTTP server binds.
    pub port: u16,
    /// Directory holding conversation documents.
    pub data_dir: PathBuf,
    /// Completion backend settings.
    pub llm: LlmConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            llm: LlmConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read configuration from `COLLOQUY_*` environment variables, keeping
    /// the default for anything unset, empty, or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env::var("COLLOQUY_PORT")
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(defaults.port),
            data_dir: env::var("COLLOQUY_DATA_DIR")
                .ok()
                .filter(|dir| !dir.is_empty())
                .map_or(defaults.data_dir, PathBuf::from),
            llm: LlmConfig {
                model: env::var("COLLOQUY_MODEL")
                    .ok()
                    .filter(|model| !model.is_empty())
                    .unwrap_or(defaults.llm.model),
                base_url: env::var("COLLOQUY_OLLAMA_URL")
                    .ok()
                    .filter(|url| !url.is_empty()),
            },
        }
    }

    /// Check the configuration for values that cannot work.
    ///
    /// # Errors
    /// Returns an error if the port is zero, the data directory or model is
    /// empty, or the Ollama base URL does not parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be nonzero".to_string()));
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "data directory must not be empty".to_string(),
            ));
        }
        if self.llm.model.is_empty() {
            return Err(ConfigError::Invalid("model must not be empty".to_string()));
        }
        if let Some(base_url) = &self.llm.base_url {
            Url::parse(base_url)?;
        }
        Ok(())
    }
}
