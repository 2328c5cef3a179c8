//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::agent::{Agent, AgentConfig};

/// Shared application state.
pub struct AppState {
    /// The conversation agent.
    pub agent: Agent,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    /// Returns an error if the agent cannot be created.
    pub fn new(config: AgentConfig) -> Result<Arc<Self>, Box<dyn std::error::Error + Send + Sync>> {
        let agent = Agent::new(config).map_err(|e| format!("Failed to create agent: {e}"))?;
        Ok(Arc::new(Self { agent }))
    }
}
