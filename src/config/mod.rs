//! Application configuration
//!
//! Layers, lowest priority first: built-in defaults, the global
//! `~/.agentic-research/config.toml`, an explicit `--config` file,
//! environment variables. CLI flags are applied by the binary on top.
//! The API key is never read from a config file; see [`secrets`].

pub mod merger;
pub mod secrets;

pub use merger::{ConfigMerger, PartialConfig};
pub use secrets::SecretsConfig;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable carrying the chat-completion API key
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Chat-completion endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    /// Fixed per-request timeout. There is no retry.
    pub timeout_secs: u64,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            model: "deepseek/deepseek-r1".to_string(),
            max_tokens: 512,
            temperature: 0.2,
            timeout_secs: 20,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Artificial I/O delay before the data alchemist synthesizes rows
    pub alchemist_delay_ms: u64,
    /// Bound on retained runs; only terminal runs are evicted. `None` keeps
    /// every run for the process lifetime.
    pub max_retained_runs: Option<usize>,
    /// How much of the serialized results the critic sees
    pub critic_context_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            alchemist_delay_ms: 800,
            max_retained_runs: None,
            critic_context_chars: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Allowed CORS origins. `None` or empty allows any origin.
    pub cors_origins: Option<Vec<String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub pipeline: PipelineConfig,
    pub server: ServerConfig,
}

/// Path of the global config file (~/.agentic-research/config.toml)
pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".agentic-research").join("config.toml"))
}

/// Read one config layer. A missing file is not an error.
pub fn read_partial(path: &Path) -> Result<Option<PartialConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let partial = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    log::debug!("Loaded config layer from {}", path.display());
    Ok(Some(partial))
}

/// Load the full configuration from the global file, an optional explicit
/// file and the process environment, then resolve the API key.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let global = match global_config_path() {
        Some(path) => read_partial(&path)?,
        None => None,
    };

    let file = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
                });
            }
            read_partial(path)?
        }
        None => None,
    };

    let env = PartialConfig::from_env(|key| std::env::var(key).ok());

    let mut config = ConfigMerger::new()
        .with_global(global)
        .with_file(file)
        .with_env(Some(env))
        .merge();

    config.llm.api_key = secrets::resolve_api_key(std::env::var(API_KEY_ENV).ok());
    Ok(config)
}
