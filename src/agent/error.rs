//! Error types for the agent subsystem.

use thiserror::Error;

use crate::gateway::GatewayError;

/// Agent subsystem error type.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// HTTP client error from Rig.
    #[error("http client error: {0}")]
    HttpClient(#[from] rig::http_client::Error),
    /// Completion error.
    #[error("completion error: {0}")]
    Completion(#[from] rig::completion::CompletionError),
    /// Tool gateway error.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// URL parse error.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}

/// Convenience result alias for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;
