// API key resolution
//
// The key comes from OPENROUTER_API_KEY, falling back to
// ~/.agentic-research/secrets.toml:
//
//   [api_tokens]
//   openrouter = "sk-or-..."

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Provider id used as the key in `api_tokens`
pub const PROVIDER_ID: &str = "openrouter";

/// Secrets stored in ~/.agentic-research/secrets.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecretsConfig {
    /// API tokens indexed by provider ID (e.g., "openrouter" -> "sk-or-...")
    #[serde(default)]
    pub api_tokens: HashMap<String, String>,
}

impl SecretsConfig {
    /// Get the secrets file path (~/.agentic-research/secrets.toml)
    pub fn get_secrets_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".agentic-research").join("secrets.toml"))
    }

    /// Load secrets from the default location
    pub fn load() -> Result<Self> {
        let path = Self::get_secrets_path()
            .ok_or_else(|| anyhow!("Could not determine home directory"))?;
        Self::load_from(&path)
    }

    /// Load secrets from `path`. A missing file yields empty secrets.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read secrets file '{}': {}", path.display(), e))?;

        let config: SecretsConfig = toml::from_str(&contents)
            .map_err(|e| anyhow!("Failed to parse secrets file '{}': {}", path.display(), e))?;

        Ok(config)
    }

    /// Get a provider's API token
    pub fn get_token(&self, provider_id: &str) -> Option<&String> {
        self.api_tokens.get(provider_id)
    }

    /// Set a provider's API token
    pub fn set_token(&mut self, provider_id: &str, token: &str) {
        self.api_tokens
            .insert(provider_id.to_string(), token.to_string());
    }

    /// Check if a provider has a token configured
    pub fn has_token(&self, provider_id: &str) -> bool {
        self.api_tokens.contains_key(provider_id)
    }
}

/// Pick the API key: a non-blank environment value wins, then the secrets file.
pub fn resolve_api_key(env_value: Option<String>) -> Option<String> {
    let secrets = match SecretsConfig::load() {
        Ok(secrets) => secrets,
        Err(e) => {
            log::warn!("Ignoring secrets file: {}", e);
            SecretsConfig::default()
        }
    };
    pick_api_key(env_value, &secrets)
}

fn pick_api_key(env_value: Option<String>, secrets: &SecretsConfig) -> Option<String> {
    env_value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            secrets
                .get_token(PROVIDER_ID)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_secrets_config_default() {
        let config = SecretsConfig::default();
        assert!(config.api_tokens.is_empty());
    }

    #[test]
    fn test_set_and_get_token() {
        let mut config = SecretsConfig::default();
        config.set_token(PROVIDER_ID, "test-token");
        assert_eq!(config.get_token(PROVIDER_ID), Some(&"test-token".to_string()));
        assert!(config.has_token(PROVIDER_ID));
        assert!(!config.has_token("other"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secrets.toml");
        fs::write(&path, "[api_tokens]\nopenrouter = \"sk-or-123\"\n").unwrap();

        let secrets = SecretsConfig::load_from(&path).unwrap();
        assert_eq!(secrets.get_token(PROVIDER_ID), Some(&"sk-or-123".to_string()));
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = TempDir::new().unwrap();
        let secrets = SecretsConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert!(secrets.api_tokens.is_empty());
    }

    #[test]
    fn test_load_from_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secrets.toml");
        fs::write(&path, "api_tokens = [").unwrap();
        assert!(SecretsConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_env_value_wins() {
        let mut secrets = SecretsConfig::default();
        secrets.set_token(PROVIDER_ID, "from-file");
        assert_eq!(
            pick_api_key(Some("from-env".to_string()), &secrets),
            Some("from-env".to_string())
        );
    }

    #[test]
    fn test_blank_env_falls_back_to_file() {
        let mut secrets = SecretsConfig::default();
        secrets.set_token(PROVIDER_ID, "from-file");
        assert_eq!(
            pick_api_key(Some("   ".to_string()), &secrets),
            Some("from-file".to_string())
        );
        assert_eq!(pick_api_key(None, &SecretsConfig::default()), None);
    }
}
