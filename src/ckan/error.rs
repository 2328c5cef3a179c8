//! Error types for the CKAN client.

use thiserror::Error;

/// Errors that can occur when talking to a CKAN portal.
#[derive(Debug, Error)]
pub enum CkanError {
    /// HTTP request failed before a response was received.
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// HTTP client configuration error.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// The portal answered with a non-success status.
    #[error("CKAN API request failed: {status} - {body}")]
    Api {
        /// HTTP status code returned by the portal.
        status: u16,
        /// Short excerpt of the response body.
        body: String,
    },

    /// The portal answered 200 but flagged the call as unsuccessful.
    #[error("CKAN API reported an unsuccessful result for {action}")]
    Unsuccessful {
        /// The CKAN action that was invoked.
        action: String,
    },

    /// The response body was not valid JSON.
    #[error("failed to parse CKAN API response: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Invalid base URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience result alias for CKAN operations.
pub type CkanResult<T> = Result<T, CkanError>;
