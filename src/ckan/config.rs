//! Configuration for the CKAN client.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::ckan::error::{CkanError, CkanResult};

/// Default CKAN portal used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://ckantesting.ogopendata.com";

/// Default page size for dataset searches.
pub const DEFAULT_ROWS: u32 = 5;

/// Maximum page size accepted by a search call.
pub const MAX_ROWS: u32 = 100;

/// Configuration for the CKAN client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CkanConfig {
    /// Base URL of the CKAN portal.
    pub base_url: String,
    /// Default number of rows per search page.
    pub default_rows: u32,
    /// Request timeout.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
    /// Connection timeout.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
}

impl Default for CkanConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_rows: DEFAULT_ROWS,
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl CkanConfig {
    /// Create a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the portal base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> CkanResult<()> {
        Url::parse(&self.base_url)?;

        if self.default_rows == 0 || self.default_rows > MAX_ROWS {
            return Err(CkanError::Config(format!(
                "default_rows must be between 1 and {MAX_ROWS}"
            )));
        }

        Ok(())
    }
}

/// Serde module for Duration serialization as whole seconds.
pub(crate) mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
