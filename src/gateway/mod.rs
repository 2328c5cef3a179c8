//! Tool gateway boundary between the agent and its data sources.
//!
//! Action nodes talk to a [`ToolGateway`] rather than to any data source
//! directly. The shipped implementation, [`CkanGateway`], serves the tool
//! vocabulary in-process over the CKAN client while preserving the remote
//! tool-call wire contract: every result is carried as a JSON string inside
//! a `content` array, so callers exercise the same payload handling they
//! would against an out-of-process peer.

pub mod config;
pub mod error;
pub mod types;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use types::{ContentPart, ToolName, ToolRequest, ToolResponse};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;

use crate::ckan;
use crate::gateway::error::GatewayResult;
use crate::gateway::types::{
    GetDatasetDetailsArgs, GetOrganizationDetailsArgs, ListOrganizationsArgs, ListTagsArgs,
    SearchDatasetsArgs, SearchDatasetsByTagArgs,
};

/// A named-tool call boundary.
#[async_trait]
pub trait ToolGateway: Send + Sync {
    /// Invoke one tool and return its response.
    ///
    /// # Errors
    /// Returns an error if the tool is unknown, its arguments are invalid,
    /// the call times out, or the upstream data source fails.
    async fn call(&self, request: ToolRequest) -> GatewayResult<ToolResponse>;
}

/// Tool gateway backed by a CKAN portal.
pub struct CkanGateway {
    client: ckan::Client,
    call_timeout: Duration,
}

impl CkanGateway {
    /// Create a gateway from configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        config.validate()?;
        let call_timeout = config.call_timeout;
        let client = ckan::Client::new(config.ckan)?;
        Ok(Self {
            client,
            call_timeout,
        })
    }

    /// Route one parsed tool call to the CKAN client and serialize the result.
    async fn dispatch(
        &self,
        name: ToolName,
        arguments: serde_json::Value,
    ) -> GatewayResult<String> {
        match name {
            ToolName::SearchDatasets => {
                let args: SearchDatasetsArgs = decode_args(name, arguments)?;
                let page = self
                    .client
                    .package_search(&args.query, args.rows, args.start)
                    .await?;
                Ok(serde_json::to_string(&page)?)
            }
            ToolName::GetDatasetDetails => {
                let args: GetDatasetDetailsArgs = decode_args(name, arguments)?;
                let details = self.client.package_show(&args.id).await?;
                Ok(serde_json::to_string(&details)?)
            }
            ToolName::ListOrganizations => {
                let args: ListOrganizationsArgs = decode_args(name, arguments)?;
                let organizations = self.client.organization_list(args.query.as_deref()).await?;
                Ok(serde_json::to_string(&organizations)?)
            }
            ToolName::GetOrganizationDetails => {
                let args: GetOrganizationDetailsArgs = decode_args(name, arguments)?;
                let details = self.client.organization_show(&args.id).await?;
                Ok(serde_json::to_string(&details)?)
            }
            ToolName::ListTags => {
                let args: ListTagsArgs = decode_args(name, arguments)?;
                let tags = self.client.tag_list(args.query.as_deref()).await?;
                Ok(serde_json::to_string(&tags)?)
            }
            ToolName::SearchDatasetsByTag => {
                let args: SearchDatasetsByTagArgs = decode_args(name, arguments)?;
                let page = self
                    .client
                    .package_search_by_tag(&args.tag, args.rows, args.start)
                    .await?;
                Ok(serde_json::to_string(&page)?)
            }
        }
    }
}

#[async_trait]
impl ToolGateway for CkanGateway {
    async fn call(&self, request: ToolRequest) -> GatewayResult<ToolResponse> {
        let name = ToolName::parse(&request.name)
            .ok_or_else(|| GatewayError::UnknownTool(request.name.clone()))?;
        tracing::debug!(tool = name.as_str(), "handling tool call");

        let payload =
            tokio::time::timeout(self.call_timeout, self.dispatch(name, request.arguments))
                .await
                .map_err(|_| GatewayError::Timeout(self.call_timeout))??;

        Ok(ToolResponse::Content {
            content: vec![ContentPart::text(payload)],
        })
    }
}

/// Lazily-initialized shared gateway handle.
///
/// The first caller establishes the gateway; concurrent first callers
/// coalesce onto the same in-flight initialization, and every later call
/// reuses the established instance. A failed initialization leaves the
/// cell empty so the next turn can try again.
pub struct SharedGateway {
    config: GatewayConfig,
    cell: OnceCell<Arc<CkanGateway>>,
}

impl SharedGateway {
    /// Create an uninitialized handle.
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            cell: OnceCell::new(),
        }
    }

    /// Get the gateway, initializing it on first use.
    ///
    /// # Errors
    /// Returns an error if initialization fails.
    pub async fn get(&self) -> GatewayResult<Arc<CkanGateway>> {
        let gateway = self
            .cell
            .get_or_try_init(|| async { CkanGateway::new(self.config.clone()).map(Arc::new) })
            .await?;
        Ok(Arc::clone(gateway))
    }
}

fn decode_args<T: DeserializeOwned>(
    tool: ToolName,
    arguments: serde_json::Value,
) -> GatewayResult<T> {
    serde_json::from_value(arguments).map_err(|e| GatewayError::InvalidArguments {
        tool: tool.as_str(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_tool_rejected() {
        let gateway = match CkanGateway::new(GatewayConfig::default()) {
            Ok(g) => g,
            Err(e) => {
                assert!(false, "gateway should build: {e}");
                return;
            }
        };
        let request = ToolRequest {
            name: "dropTables".to_string(),
            arguments: serde_json::json!({}),
        };
        assert!(matches!(
            gateway.call(request).await,
            Err(GatewayError::UnknownTool(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_required_argument_rejected() {
        let gateway = match CkanGateway::new(GatewayConfig::default()) {
            Ok(g) => g,
            Err(e) => {
                assert!(false, "gateway should build: {e}");
                return;
            }
        };
        let request = ToolRequest::new(ToolName::SearchDatasets, serde_json::json!({}));
        assert!(matches!(
            gateway.call(request).await,
            Err(GatewayError::InvalidArguments { .. })
        ));
    }

    #[tokio::test]
    async fn test_shared_gateway_coalesces_first_use() {
        let shared = SharedGateway::new(GatewayConfig::default());
        let (a, b) = tokio::join!(shared.get(), shared.get());
        match (a, b) {
            (Ok(a), Ok(b)) => assert!(Arc::ptr_eq(&a, &b)),
            _ => assert!(false, "shared gateway should initialize"),
        }
    }
}
