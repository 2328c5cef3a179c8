//! Error types for the tool gateway.

use std::time::Duration;

use thiserror::Error;

use crate::ckan::CkanError;

/// Errors that can occur when calling a tool through the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The requested tool name is not part of the gateway vocabulary.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// The tool arguments did not match the tool's parameter schema.
    #[error("invalid arguments for {tool}: {message}")]
    InvalidArguments {
        /// The tool that rejected its arguments.
        tool: &'static str,
        /// Why the arguments were rejected.
        message: String,
    },

    /// The tool call did not finish within the configured deadline.
    #[error("tool call timed out after {0:?}")]
    Timeout(Duration),

    /// The upstream data source failed.
    #[error("data source error: {0}")]
    Ckan(#[from] CkanError),

    /// A tool result could not be serialized for transport.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The gateway answered with a payload shape the caller cannot consume.
    #[error("unexpected response shape from tool gateway")]
    UnexpectedShape,
}

/// Convenience result alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
