//! Configuration for the tool gateway.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ckan::config::duration_serde;
use crate::ckan::CkanConfig;
use crate::gateway::error::GatewayResult;

/// Configuration for the CKAN-backed tool gateway.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Upstream CKAN client settings.
    pub ckan: CkanConfig,
    /// Deadline applied to each individual tool call.
    #[serde(with = "duration_serde")]
    pub call_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            ckan: CkanConfig::default(),
            call_timeout: Duration::from_secs(30),
        }
    }
}

impl GatewayConfig {
    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if the upstream CKAN settings are invalid.
    pub fn validate(&self) -> GatewayResult<()> {
        self.ckan.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GatewayConfig::default().validate().is_ok());
    }
}
