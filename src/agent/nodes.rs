//! Action nodes: one handler per classified intent.
//!
//! Every node follows the same contract: read the state, resolve its
//! parameters (classifier extraction first, then the raw user message,
//! then prior results), call the tool gateway, normalize the payload,
//! and return a partial state patch. A node never calls the gateway with
//! a missing required parameter, and every patch routes to the terminal
//! action.

use serde::de::DeserializeOwned;
use serde_json::json;

use crate::agent::state::{AgentAction, ConversationState, Message, StatePatch};
use crate::agent::summarize;
use crate::ckan::{DatasetDetails, OrganizationDetails, OrganizationSummary, SearchPage};
use crate::gateway::{ToolGateway, ToolName, ToolRequest};

/// Search datasets by keyword.
pub async fn search_datasets(state: &ConversationState, gateway: &dyn ToolGateway) -> StatePatch {
    let query = state
        .extracted
        .keywords
        .as_deref()
        .or(state.user_input.as_deref())
        .or_else(|| state.last_user_text());

    let Some(query) = query else {
        return StatePatch::error(
            "I need some keywords to search for datasets. What topic are you interested in?",
        );
    };

    let request = ToolRequest::new(ToolName::SearchDatasets, json!({ "query": query }));
    let page: SearchPage = match call_and_decode(
        gateway,
        request,
        "search service",
        "Error searching datasets",
    )
    .await
    {
        Ok(page) => page,
        Err(patch) => return *patch,
    };

    let summary = summarize::search_datasets(&page);
    StatePatch {
        messages: vec![Message::assistant(summary.clone())],
        search_results: Some(page.results),
        last_summary: Some(summary),
        next_action: Some(AgentAction::End),
        ..StatePatch::default()
    }
}

/// Fetch the details of one dataset.
pub async fn get_dataset_details(
    state: &ConversationState,
    gateway: &dyn ToolGateway,
) -> StatePatch {
    // Resolution order: extracted id, then the raw user message, then the
    // first hit of a previous search.
    let dataset_id = state
        .extracted
        .dataset_id
        .clone()
        .or_else(|| state.user_input.clone())
        .or_else(|| {
            state
                .search_results
                .as_ref()
                .and_then(|results| results.first())
                .map(|dataset| dataset.id.clone())
        });

    let Some(dataset_id) = dataset_id else {
        return StatePatch::error(
            "I need a dataset ID to fetch details. Which dataset do you mean?",
        );
    };

    let request = ToolRequest::new(ToolName::GetDatasetDetails, json!({ "id": dataset_id }));
    let details: DatasetDetails = match call_and_decode(
        gateway,
        request,
        "dataset details service",
        "Error getting dataset details",
    )
    .await
    {
        Ok(details) => details,
        Err(patch) => return *patch,
    };

    let summary = summarize::dataset_details(&details);
    StatePatch {
        messages: vec![Message::assistant(summary.clone())],
        dataset_details: Some(details),
        last_summary: Some(summary),
        next_action: Some(AgentAction::End),
        ..StatePatch::default()
    }
}

/// List organizations publishing on the portal.
pub async fn list_organizations(
    state: &ConversationState,
    gateway: &dyn ToolGateway,
) -> StatePatch {
    let arguments = state
        .extracted
        .keywords
        .as_deref()
        .map_or_else(|| json!({}), |keywords| json!({ "query": keywords }));

    let request = ToolRequest::new(ToolName::ListOrganizations, arguments);
    let organizations: Vec<OrganizationSummary> = match call_and_decode(
        gateway,
        request,
        "organization service",
        "Error listing organizations",
    )
    .await
    {
        Ok(organizations) => organizations,
        Err(patch) => return *patch,
    };

    let summary = summarize::organizations(&organizations);
    StatePatch {
        messages: vec![Message::assistant(summary.clone())],
        organizations: Some(organizations),
        last_summary: Some(summary),
        next_action: Some(AgentAction::End),
        ..StatePatch::default()
    }
}

/// Fetch the details of one organization.
pub async fn get_organization_details(
    state: &ConversationState,
    gateway: &dyn ToolGateway,
) -> StatePatch {
    let organization_id = state
        .extracted
        .organization_id
        .clone()
        .or_else(|| state.user_input.clone())
        .or_else(|| {
            state
                .organizations
                .as_ref()
                .and_then(|organizations| organizations.first())
                .map(|organization| organization.id.clone())
        });

    let Some(organization_id) = organization_id else {
        return StatePatch::error(
            "I need an organization ID to fetch details. Which organization do you mean?",
        );
    };

    let request = ToolRequest::new(
        ToolName::GetOrganizationDetails,
        json!({ "id": organization_id }),
    );
    let details: OrganizationDetails = match call_and_decode(
        gateway,
        request,
        "organization details service",
        "Error getting organization details",
    )
    .await
    {
        Ok(details) => details,
        Err(patch) => return *patch,
    };

    let summary = summarize::organization_details(&details);
    StatePatch {
        messages: vec![Message::assistant(summary.clone())],
        organization_details: Some(details),
        last_summary: Some(summary),
        next_action: Some(AgentAction::End),
        ..StatePatch::default()
    }
}

/// List tags, optionally filtered by the extracted keywords.
pub async fn list_tags(state: &ConversationState, gateway: &dyn ToolGateway) -> StatePatch {
    let arguments = state
        .extracted
        .keywords
        .as_deref()
        .map_or_else(|| json!({}), |keywords| json!({ "query": keywords }));

    let request = ToolRequest::new(ToolName::ListTags, arguments);
    let tags: Vec<String> =
        match call_and_decode(gateway, request, "tag service", "Error listing tags").await {
            Ok(tags) => tags,
            Err(patch) => return *patch,
        };

    let summary = summarize::tags(&tags);
    StatePatch {
        messages: vec![Message::assistant(summary.clone())],
        tags: Some(tags),
        last_summary: Some(summary),
        next_action: Some(AgentAction::End),
        ..StatePatch::default()
    }
}

/// Search datasets carrying a specific tag.
pub async fn search_datasets_by_tag(
    state: &ConversationState,
    gateway: &dyn ToolGateway,
) -> StatePatch {
    let tag = state
        .extracted
        .tag
        .clone()
        .or_else(|| state.user_input.clone());

    let Some(tag) = tag else {
        return StatePatch::error("I need a tag to search by. Which tag should I use?");
    };

    let request = ToolRequest::new(ToolName::SearchDatasetsByTag, json!({ "tag": tag }));
    let page: SearchPage = match call_and_decode(
        gateway,
        request,
        "search service",
        "Error searching datasets by tag",
    )
    .await
    {
        Ok(page) => page,
        Err(patch) => return *patch,
    };

    let summary = summarize::search_datasets(&page);
    StatePatch {
        messages: vec![Message::assistant(summary.clone())],
        search_results: Some(page.results),
        last_summary: Some(summary),
        next_action: Some(AgentAction::End),
        ..StatePatch::default()
    }
}

/// Call one tool and decode its JSON payload into a typed record.
///
/// The three failure modes stay distinguishable for the user:
/// gateway/upstream errors carry the node's failure prefix, a response in
/// an unconsumable shape yields an "unexpected data format" message, and
/// a payload that is not valid JSON for the expected record yields an
/// "error processing data" message.
async fn call_and_decode<T: DeserializeOwned>(
    gateway: &dyn ToolGateway,
    request: ToolRequest,
    service: &str,
    failure: &str,
) -> Result<T, Box<StatePatch>> {
    let tool = request.name.clone();
    let response = match gateway.call(request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(tool = %tool, error = %e, "tool call failed");
            return Err(Box::new(StatePatch::error(format!("{failure}: {e}"))));
        }
    };

    let Some(raw) = response.payload() else {
        tracing::error!(tool = %tool, response = ?response, "tool response not in the expected string format");
        return Err(Box::new(StatePatch::error(format!(
            "Unexpected data format from {service}."
        ))));
    };

    match serde_json::from_str(raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::error!(tool = %tool, payload = %raw, error = %e, "failed to decode tool payload");
            Err(Box::new(StatePatch::error(format!(
                "Error processing data from {service}."
            ))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::agent::state::ExtractedParams;
    use crate::ckan::{CkanError, DatasetSummary};
    use crate::gateway::error::GatewayResult;
    use crate::gateway::{ContentPart, GatewayError, ToolResponse};

    enum MockBehavior {
        Payload(String),
        RawResponse(ToolResponse),
        NetworkFailure(String),
    }

    struct MockGateway {
        behavior: MockBehavior,
        calls: Mutex<Vec<ToolRequest>>,
    }

    impl MockGateway {
        fn payload(payload: impl Into<String>) -> Self {
            Self {
                behavior: MockBehavior::Payload(payload.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn raw(response: ToolResponse) -> Self {
            Self {
                behavior: MockBehavior::RawResponse(response),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: impl Into<String>) -> Self {
            Self {
                behavior: MockBehavior::NetworkFailure(message.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
        }
    }

    #[async_trait]
    impl ToolGateway for MockGateway {
        async fn call(&self, request: ToolRequest) -> GatewayResult<ToolResponse> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(request);
            }
            match &self.behavior {
                MockBehavior::Payload(payload) => Ok(ToolResponse::Content {
                    content: vec![ContentPart::text(payload.clone())],
                }),
                MockBehavior::RawResponse(response) => Ok(response.clone()),
                MockBehavior::NetworkFailure(message) => {
                    Err(GatewayError::Ckan(CkanError::HttpClient(message.clone())))
                }
            }
        }
    }

    fn search_page_payload(count: u64, listed: usize) -> String {
        let results: Vec<serde_json::Value> = (0..listed)
            .map(|i| {
                json!({
                    "id": format!("id-{i}"),
                    "title": format!("Dataset {i}"),
                    "notes": "notes",
                    "organization_title": "City Data Office"
                })
            })
            .collect();
        json!({ "count": count, "results": results }).to_string()
    }

    fn state_with_keywords(keywords: &str) -> ConversationState {
        let mut state = ConversationState::resume(vec![], "search for things");
        state.extracted = ExtractedParams {
            keywords: Some(keywords.to_string()),
            ..ExtractedParams::default()
        };
        state
    }

    #[tokio::test]
    async fn test_search_happy_path() {
        let gateway = MockGateway::payload(search_page_payload(12, 5));
        let state = state_with_keywords("water quality");

        let patch = search_datasets(&state, &gateway).await;

        assert_eq!(patch.next_action, Some(AgentAction::End));
        assert!(patch.error.is_none());
        assert_eq!(
            patch.search_results.as_ref().map(Vec::len),
            Some(5)
        );
        let summary = patch.last_summary.unwrap_or_default();
        assert!(summary.contains("12"));
        assert!(summary.contains("More datasets are available"));
        assert_eq!(patch.messages.len(), 1);
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test]
    async fn test_search_falls_back_to_user_text() {
        let gateway = MockGateway::payload(search_page_payload(0, 0));
        let state = ConversationState::resume(vec![], "transport schedules");

        let patch = search_datasets(&state, &gateway).await;

        assert!(patch.error.is_none());
        assert_eq!(gateway.call_count(), 1);
        let summary = patch.last_summary.unwrap_or_default();
        assert!(summary.contains("No datasets were found"));
    }

    #[tokio::test]
    async fn test_search_without_any_query_skips_gateway() {
        let gateway = MockGateway::payload(search_page_payload(1, 1));
        let state = ConversationState::default();

        let patch = search_datasets(&state, &gateway).await;

        assert!(patch.error.is_some());
        assert_eq!(gateway.call_count(), 0);
        assert_eq!(patch.next_action, Some(AgentAction::End));
    }

    #[tokio::test]
    async fn test_details_network_error_keeps_prior_result() {
        let gateway = MockGateway::failing("connection refused");
        let mut state = ConversationState::resume(vec![], "show me abc-123");
        state.extracted.dataset_id = Some("abc-123".to_string());

        let patch = get_dataset_details(&state, &gateway).await;

        let error = patch.error.clone().unwrap_or_default();
        assert!(error.starts_with("Error getting dataset details"));
        assert!(patch.dataset_details.is_none());
        assert_eq!(patch.messages.len(), 1);

        // Merging the patch must not disturb previously fetched results.
        state.search_results = Some(vec![DatasetSummary {
            id: "earlier".to_string(),
            title: "Earlier".to_string(),
            notes: String::new(),
            organization_title: None,
        }]);
        state.apply(patch);
        assert!(state.dataset_details.is_none());
        assert_eq!(state.search_results.as_ref().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_details_unexpected_shape_message() {
        let gateway = MockGateway::raw(ToolResponse::Content {
            content: vec![ContentPart {
                kind: "image".to_string(),
                text: String::new(),
            }],
        });
        let mut state = ConversationState::resume(vec![], "details please");
        state.extracted.dataset_id = Some("abc".to_string());

        let patch = get_dataset_details(&state, &gateway).await;
        let error = patch.error.unwrap_or_default();
        assert!(error.contains("Unexpected data format"));
    }

    #[tokio::test]
    async fn test_details_bad_json_message_is_distinct() {
        let gateway = MockGateway::payload("this is not json");
        let mut state = ConversationState::resume(vec![], "details please");
        state.extracted.dataset_id = Some("abc".to_string());

        let patch = get_dataset_details(&state, &gateway).await;
        let error = patch.error.unwrap_or_default();
        assert!(error.contains("Error processing data"));
        assert!(!error.contains("Unexpected data format"));
    }

    #[tokio::test]
    async fn test_details_falls_back_to_first_search_result() {
        let details_payload = json!({
            "id": "prior-1",
            "title": "Prior Dataset",
            "name": "prior-dataset",
            "notes": "notes",
            "organization_title": null,
            "num_resources": 0,
            "num_tags": 0,
            "tags": [],
            "resources_summary": [],
            "license_title": null,
            "metadata_created": null,
            "metadata_modified": null,
            "url": "https://portal.example/dataset/prior-dataset"
        })
        .to_string();
        let gateway = MockGateway::payload(details_payload);

        let mut state = ConversationState::default();
        state.search_results = Some(vec![DatasetSummary {
            id: "prior-1".to_string(),
            title: "Prior Dataset".to_string(),
            notes: String::new(),
            organization_title: None,
        }]);

        let patch = get_dataset_details(&state, &gateway).await;

        assert!(patch.error.is_none());
        let calls = gateway.calls.lock().map(|c| c.clone()).unwrap_or_default();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].arguments, json!({ "id": "prior-1" }));
    }

    #[tokio::test]
    async fn test_bare_string_response_accepted() {
        let gateway = MockGateway::raw(ToolResponse::Text(search_page_payload(2, 2)));
        let state = state_with_keywords("roads");

        let patch = search_datasets(&state, &gateway).await;
        assert!(patch.error.is_none());
        assert_eq!(patch.search_results.as_ref().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_tag_search_requires_tag() {
        let gateway = MockGateway::payload(search_page_payload(0, 0));
        let state = ConversationState::default();

        let patch = search_datasets_by_tag(&state, &gateway).await;
        assert!(patch.error.is_some());
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn test_list_tags_passes_filter() {
        let gateway = MockGateway::payload(json!(["health", "healthcare"]).to_string());
        let state = state_with_keywords("health");

        let patch = list_tags(&state, &gateway).await;

        assert!(patch.error.is_none());
        assert_eq!(patch.tags.as_ref().map(Vec::len), Some(2));
        let calls = gateway.calls.lock().map(|c| c.clone()).unwrap_or_default();
        assert_eq!(calls[0].arguments, json!({ "query": "health" }));
    }

    #[tokio::test]
    async fn test_list_organizations_summary() {
        let payload = json!([
            { "id": "org-1", "name": "env", "title": "Environment Agency", "package_count": 10 }
        ])
        .to_string();
        let gateway = MockGateway::payload(payload);
        let state = ConversationState::resume(vec![], "who publishes data?");

        let patch = list_organizations(&state, &gateway).await;

        assert!(patch.error.is_none());
        let summary = patch.last_summary.unwrap_or_default();
        assert!(summary.contains("Environment Agency"));
        assert!(summary.contains("10 dataset(s)"));
    }
}
