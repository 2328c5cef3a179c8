//! The conversation agent: a single-hop classify → dispatch → terminate pipeline.
//!
//! Each incoming user message makes exactly one pass through the machine:
//! the classifier picks one action out of the closed vocabulary, the
//! matching node calls the tool gateway and normalizes the result, and the
//! turn ends. No node loops back to classification and nothing is retried;
//! a failed classification or tool call ends the turn with an error
//! message so the user-visible thread never desynchronizes.

pub mod classifier;
pub mod config;
pub mod error;
pub mod nodes;
pub mod state;
pub mod summarize;

pub use classifier::IntentClassifier;
pub use config::{AgentConfig, LlmConfig};
pub use error::AgentError;
pub use state::{AgentAction, ConversationState, Message, StatePatch};

use crate::agent::error::AgentResult;
use crate::gateway::SharedGateway;

/// The conversation agent.
///
/// Owns the intent classifier and the shared tool gateway handle; holds no
/// per-conversation state. Conversation state is created per turn by the
/// caller and handed back after one pass.
pub struct Agent {
    classifier: IntentClassifier,
    gateway: SharedGateway,
}

impl Agent {
    /// Create a new agent from configuration.
    ///
    /// The gateway itself is established lazily on the first tool call.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the classifier
    /// cannot be built.
    pub fn new(config: AgentConfig) -> AgentResult<Self> {
        config.validate()?;
        let classifier = IntentClassifier::new(&config.llm)?;
        let gateway = SharedGateway::new(config.gateway);
        Ok(Self {
            classifier,
            gateway,
        })
    }

    /// Run one turn of the conversation.
    ///
    /// Classifies the most recent user message, dispatches to exactly one
    /// action node, merges its patch, and returns the terminal state.
    /// Every path appends at least one assistant message.
    pub async fn run_turn(&self, mut state: ConversationState) -> ConversationState {
        let patch = self.classifier.classify(&state).await;
        state.apply(patch);

        if state.error.is_some() {
            state.next_action = AgentAction::End;
            return state;
        }

        let action = state.next_action;
        if action == AgentAction::End {
            return state;
        }

        let gateway = match self.gateway.get().await {
            Ok(gateway) => gateway,
            Err(e) => {
                tracing::error!(error = %e, "failed to establish tool gateway");
                state.apply(StatePatch::error(format!(
                    "Error connecting to the data service: {e}"
                )));
                return state;
            }
        };

        tracing::info!(action = action.as_str(), "dispatching action node");
        let patch = dispatch(action, &state, gateway.as_ref()).await;
        state.apply(patch);

        // Terminal invariant, idempotent with the nodes' own End patches.
        state.next_action = AgentAction::End;
        state
    }
}

/// The single edge out of classification: route one action to its node.
///
/// The match is exhaustive over the closed action set, so adding an action
/// is a compile-time change here rather than a runtime string lookup.
pub async fn dispatch(
    action: AgentAction,
    state: &ConversationState,
    gateway: &dyn crate::gateway::ToolGateway,
) -> StatePatch {
    match action {
        AgentAction::SearchDatasets => nodes::search_datasets(state, gateway).await,
        AgentAction::GetDatasetDetails => nodes::get_dataset_details(state, gateway).await,
        AgentAction::ListOrganizations => nodes::list_organizations(state, gateway).await,
        AgentAction::GetOrganizationDetails => {
            nodes::get_organization_details(state, gateway).await
        }
        AgentAction::ListTags => nodes::list_tags(state, gateway).await,
        AgentAction::SearchDatasetsByTag => nodes::search_datasets_by_tag(state, gateway).await,
        // End performs no tool work; the turn is already terminal.
        AgentAction::End => StatePatch::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::agent::state::{ExtractedParams, Role};
    use crate::ckan::CkanError;
    use crate::gateway::error::GatewayResult;
    use crate::gateway::{ContentPart, GatewayError, ToolGateway, ToolRequest, ToolResponse};

    struct StaticGateway {
        payload: Result<String, String>,
    }

    #[async_trait]
    impl ToolGateway for StaticGateway {
        async fn call(&self, _request: ToolRequest) -> GatewayResult<ToolResponse> {
            match &self.payload {
                Ok(payload) => Ok(ToolResponse::Content {
                    content: vec![ContentPart::text(payload.clone())],
                }),
                Err(message) => Err(GatewayError::Ckan(CkanError::HttpClient(message.clone()))),
            }
        }
    }

    #[test]
    fn test_agent_builds_from_default_config() {
        assert!(Agent::new(AgentConfig::default()).is_ok());
    }

    #[test]
    fn test_agent_rejects_invalid_config() {
        let mut config = AgentConfig::default();
        config.gateway.ckan.base_url = "not a url".to_string();
        assert!(Agent::new(config).is_err());
    }

    // A classified search for "water quality" that finds 12 datasets must
    // report the total, list the page, and end the turn.
    #[tokio::test]
    async fn test_search_scenario_end_to_end() {
        let results: Vec<serde_json::Value> = (0..5)
            .map(|i| {
                json!({
                    "id": format!("id-{i}"),
                    "title": format!("Water Quality {i}"),
                    "notes": "notes",
                    "organization_title": null
                })
            })
            .collect();
        let gateway = StaticGateway {
            payload: Ok(json!({ "count": 12, "results": results }).to_string()),
        };

        let mut state = ConversationState::resume(vec![], "search for water quality datasets");
        state.next_action = AgentAction::SearchDatasets;
        state.extracted = ExtractedParams {
            keywords: Some("water quality".to_string()),
            ..ExtractedParams::default()
        };

        let patch = dispatch(AgentAction::SearchDatasets, &state, &gateway).await;
        state.apply(patch);

        assert_eq!(state.next_action, AgentAction::End);
        assert!(state.error.is_none());
        let summary = state.last_summary.clone().unwrap_or_default();
        assert!(summary.contains("12"));
        assert!(summary.contains("More datasets are available"));
        assert_eq!(state.search_results.as_ref().map(Vec::len), Some(5));
        // One user message plus one assistant summary.
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[1].role, Role::Assistant);
    }

    // A gateway failure during a detail fetch must surface the prefixed
    // error and leave prior results untouched.
    #[tokio::test]
    async fn test_detail_failure_scenario_end_to_end() {
        let gateway = StaticGateway {
            payload: Err("connection reset by peer".to_string()),
        };

        let mut state = ConversationState::resume(vec![], "get details for id-3");
        state.extracted = ExtractedParams {
            dataset_id: Some("id-3".to_string()),
            ..ExtractedParams::default()
        };

        let patch = dispatch(AgentAction::GetDatasetDetails, &state, &gateway).await;
        state.apply(patch);

        assert_eq!(state.next_action, AgentAction::End);
        let error = state.error.clone().unwrap_or_default();
        assert!(error.starts_with("Error getting dataset details"));
        assert!(state.dataset_details.is_none());
        assert_eq!(state.messages.len(), 2);
    }

    // End performs no tool work.
    #[tokio::test]
    async fn test_end_action_dispatch_is_inert() {
        let gateway = StaticGateway {
            payload: Ok("{}".to_string()),
        };
        let state = ConversationState::resume(vec![], "thanks!");

        let patch = dispatch(AgentAction::End, &state, &gateway).await;
        assert!(patch.messages.is_empty());
        assert!(patch.error.is_none());
        assert!(patch.next_action.is_none());
    }
}
