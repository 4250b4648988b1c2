// Configuration merging with priority

use super::{AppConfig, LlmConfig, PipelineConfig, ServerConfig};
use serde::{Deserialize, Serialize};

/// Partial configuration for merging
/// Uses Option<T> for all fields to support partial overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PartialConfig {
    #[serde(default)]
    pub llm: Option<PartialLlmConfig>,
    #[serde(default)]
    pub pipeline: Option<PartialPipelineConfig>,
    #[serde(default)]
    pub server: Option<PartialServerConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PartialLlmConfig {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PartialPipelineConfig {
    pub alchemist_delay_ms: Option<u64>,
    pub max_retained_runs: Option<usize>,
    pub critic_context_chars: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PartialServerConfig {
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub cors_origins: Option<Vec<String>>,
}

impl PartialConfig {
    /// Build the environment layer from a variable lookup.
    ///
    /// Recognized: `RESEARCH_LLM_MODEL`, `RESEARCH_LLM_BASE_URL`,
    /// `RESEARCH_BIND`, `RESEARCH_PORT`. Unparseable values are ignored
    /// with a warning.
    pub fn from_env<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let model = lookup("RESEARCH_LLM_MODEL").filter(|v| !v.trim().is_empty());
        let base_url = lookup("RESEARCH_LLM_BASE_URL").filter(|v| !v.trim().is_empty());
        let bind = lookup("RESEARCH_BIND").filter(|v| !v.trim().is_empty());
        let port = lookup("RESEARCH_PORT").and_then(|v| match v.trim().parse::<u16>() {
            Ok(port) => Some(port),
            Err(e) => {
                log::warn!("Ignoring RESEARCH_PORT={:?}: {}", v, e);
                None
            }
        });

        let llm = (model.is_some() || base_url.is_some()).then(|| PartialLlmConfig {
            model,
            base_url,
            ..Default::default()
        });
        let server = (bind.is_some() || port.is_some()).then(|| PartialServerConfig {
            bind,
            port,
            ..Default::default()
        });

        Self {
            llm,
            pipeline: None,
            server,
        }
    }
}

/// Configuration merger
/// Priority order: Env -> File -> Global -> Defaults
pub struct ConfigMerger {
    defaults: AppConfig,
    global: Option<PartialConfig>,
    file: Option<PartialConfig>,
    env: Option<PartialConfig>,
}

impl ConfigMerger {
    /// Create a new config merger with defaults
    pub fn new() -> Self {
        Self {
            defaults: AppConfig::default(),
            global: None,
            file: None,
            env: None,
        }
    }

    /// Set global config (~/.agentic-research/config.toml)
    pub fn with_global(mut self, config: Option<PartialConfig>) -> Self {
        self.global = config;
        self
    }

    /// Set the explicit `--config` file layer
    pub fn with_file(mut self, config: Option<PartialConfig>) -> Self {
        self.file = config;
        self
    }

    /// Set environment overrides
    pub fn with_env(mut self, config: Option<PartialConfig>) -> Self {
        self.env = config;
        self
    }

    /// Merge all layers with priority
    pub fn merge(&self) -> AppConfig {
        let mut result = self.defaults.clone();

        for layer in [&self.global, &self.file, &self.env].into_iter().flatten() {
            result = self.merge_partial(&result, layer);
        }

        result
    }

    fn merge_partial(&self, base: &AppConfig, partial: &PartialConfig) -> AppConfig {
        AppConfig {
            llm: partial
                .llm
                .as_ref()
                .map(|p| self.merge_llm(&base.llm, p))
                .unwrap_or_else(|| base.llm.clone()),
            pipeline: partial
                .pipeline
                .as_ref()
                .map(|p| self.merge_pipeline(&base.pipeline, p))
                .unwrap_or_else(|| base.pipeline.clone()),
            server: partial
                .server
                .as_ref()
                .map(|p| self.merge_server(&base.server, p))
                .unwrap_or_else(|| base.server.clone()),
        }
    }

    fn merge_llm(&self, base: &LlmConfig, partial: &PartialLlmConfig) -> LlmConfig {
        LlmConfig {
            base_url: partial
                .base_url
                .clone()
                .unwrap_or_else(|| base.base_url.clone()),
            model: partial.model.clone().unwrap_or_else(|| base.model.clone()),
            max_tokens: partial.max_tokens.unwrap_or(base.max_tokens),
            temperature: partial.temperature.unwrap_or(base.temperature),
            timeout_secs: partial.timeout_secs.unwrap_or(base.timeout_secs),
            api_key: base.api_key.clone(),
        }
    }

    fn merge_pipeline(
        &self,
        base: &PipelineConfig,
        partial: &PartialPipelineConfig,
    ) -> PipelineConfig {
        PipelineConfig {
            alchemist_delay_ms: partial.alchemist_delay_ms.unwrap_or(base.alchemist_delay_ms),
            max_retained_runs: partial.max_retained_runs.or(base.max_retained_runs),
            critic_context_chars: partial
                .critic_context_chars
                .unwrap_or(base.critic_context_chars),
        }
    }

    fn merge_server(&self, base: &ServerConfig, partial: &PartialServerConfig) -> ServerConfig {
        ServerConfig {
            bind: partial.bind.clone().unwrap_or_else(|| base.bind.clone()),
            port: partial.port.unwrap_or(base.port),
            cors_origins: partial
                .cors_origins
                .clone()
                .or_else(|| base.cors_origins.clone()),
        }
    }
}

impl Default for ConfigMerger {
    fn default() -> Self {
        Self::new()
    }
}
