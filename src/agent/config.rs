//! Configuration for the agent.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::agent::error::{AgentError, AgentResult};
use crate::ckan::config::duration_serde;
use crate::gateway::GatewayConfig;

/// Top-level configuration for the agent.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Completion model settings for intent classification.
    pub llm: LlmConfig,
    /// Tool gateway settings.
    pub gateway: GatewayConfig,
}

impl AgentConfig {
    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> AgentResult<()> {
        if self.llm.model.is_empty() {
            return Err(AgentError::InvalidConfig(
                "llm.model must not be empty".to_string(),
            ));
        }

        if let Some(base_url) = &self.llm.base_url {
            Url::parse(base_url)?;
        }

        self.gateway
            .validate()
            .map_err(|e| AgentError::InvalidConfig(e.to_string()))?;

        Ok(())
    }
}

/// Completion model settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Ollama completion model name.
    pub model: String,
    /// Temperature for generation. Kept low for deterministic JSON output.
    pub temperature: f64,
    /// Optional max tokens.
    pub max_tokens: Option<u64>,
    /// Optional custom base URL.
    pub base_url: Option<String>,
    /// Deadline applied to each classification call.
    #[serde(with = "duration_serde")]
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "ministral-3:8b-instruct-2512-q8_0".to_string(),
            temperature: 0.2,
            max_tokens: None,
            base_url: None,
            timeout: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AgentConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_model_rejected() {
        let mut config = AgentConfig::default();
        config.llm.model = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_base_url_rejected() {
        let mut config = AgentConfig::default();
        config.llm.base_url = Some("not a url".to_string());
        assert!(config.validate().is_err());
    }
}
