//! LLM-backed intent classification.
//!
//! One call per turn: the most recent user message is routed through a
//! completion model that must answer with a strict JSON object naming one
//! action from the closed vocabulary plus its parameters. Every failure
//! mode folds into a terminal `End` patch; classification never throws to
//! the state machine and is never retried.

use std::time::Duration;

use regex::Regex;
use reqwest::Client as ReqwestClient;
use rig::client::CompletionClient;
use rig::completion::CompletionModel;
use rig::message::AssistantContent;
use rig::providers::ollama;
use serde::Deserialize;

use crate::agent::config::LlmConfig;
use crate::agent::error::{AgentError, AgentResult};
use crate::agent::state::{
    AgentAction, ConversationState, ExtractedParams, Message, StatePatch,
};

/// Fenced code block wrapper some models put around their JSON answer.
const FENCED_JSON: &str = r"(?s)```(?:json)?\s*(\{.*?\})\s*```";

/// Intent classifier over an Ollama completion model.
pub struct IntentClassifier {
    model: ollama::CompletionModel,
    temperature: f64,
    max_tokens: Option<u64>,
    timeout: Duration,
}

impl IntentClassifier {
    /// Create a new classifier from the completion model config.
    ///
    /// # Errors
    /// Returns an error if the Ollama client cannot be built.
    pub fn new(config: &LlmConfig) -> AgentResult<Self> {
        let builder = ollama::Client::<ReqwestClient>::builder().api_key(rig::client::Nothing);
        let builder = if let Some(base_url) = &config.base_url {
            builder.base_url(base_url)
        } else {
            builder
        };
        let client = builder.build().map_err(AgentError::from)?;
        let model = client.completion_model(config.model.clone());
        Ok(Self {
            model,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: config.timeout,
        })
    }

    /// Classify the most recent user message into an action plus parameters.
    ///
    /// Always returns a patch: on any model, timeout, or parse failure the
    /// patch routes to [`AgentAction::End`] and carries the error.
    pub async fn classify(&self, state: &ConversationState) -> StatePatch {
        let Some(user_text) = state.last_user_text() else {
            return StatePatch::error("No user message content found to determine intent.");
        };

        let request = self
            .model
            .completion_request(user_text.to_string())
            .preamble(intent_instructions(user_text))
            .temperature(self.temperature)
            .max_tokens_opt(self.max_tokens)
            .build();

        let response = match tokio::time::timeout(self.timeout, self.model.completion(request)).await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "intent completion call failed");
                return StatePatch::error(format!("LLM invocation failed: {e}"));
            }
            Err(_) => {
                tracing::error!(timeout = ?self.timeout, "intent completion call timed out");
                return StatePatch::error("LLM invocation timed out while determining intent.");
            }
        };

        let raw = extract_text(&response.choice);
        if raw.trim().is_empty() {
            return StatePatch::error("LLM response format error for intent.");
        }
        tracing::debug!(raw = %raw, "raw intent response");

        let intent = match parse_intent(&raw) {
            Ok(intent) => intent,
            Err(e) => {
                tracing::error!(raw = %raw, error = %e, "failed to parse intent JSON");
                return StatePatch::error("Failed to parse LLM intent from response.");
            }
        };

        let action = AgentAction::from_wire(intent.action.as_deref().unwrap_or("END"));
        let extracted = ExtractedParams {
            keywords: clean(intent.keywords),
            dataset_id: clean(intent.dataset_id),
            organization_id: clean(intent.organization_id),
            tag: clean(intent.tag_to_search_by),
        };

        tracing::info!(action = action.as_str(), "intent determined");

        let note = decision_note(action, &extracted);
        let mut patch = StatePatch {
            messages: vec![Message::thinking(note.clone())],
            next_action: Some(action),
            extracted: Some(extracted),
            ..StatePatch::default()
        };
        if action == AgentAction::End {
            patch.last_summary = Some(note);
        }
        patch
    }
}

/// The fixed instruction block enumerating the action vocabulary.
fn intent_instructions(user_text: &str) -> String {
    format!(
        r#"You help users explore open government data on a CKAN portal. Based on the user's message, determine the most appropriate action and any necessary parameters.
Available actions:
- "searchDatasets": To find datasets by keywords.
  - Parameters: "keywords" (string, required)
- "getDatasetDetails": To get detailed information about a specific dataset.
  - Parameters: "datasetId" (string, required)
- "listOrganizations": To list available organizations/publishers of data.
  - Parameters: "keywords" (string, optional) to filter organizations.
- "getOrganizationDetails": To get details about a specific organization.
  - Parameters: "organizationId" (string, required)
- "listTags": To discover tags or find specific tags by a query.
  - Parameters: "keywords" (string, optional, to search for specific tags)
- "searchDatasetsByTag": To find datasets associated with a specific tag.
  - Parameters: "tagToSearchBy" (string, required)
- "END": If no specific data action is implied or the message is general conversation.

Special instructions for "searchDatasets":
- The search returns a total `count` and a `results` page. If `count` is greater than the number of listed results, briefly mention that more datasets are available.
- If `count` is exactly 1, suggest "getDatasetDetails" for that single dataset as the next logical step.

Based on the user's message: "{user_text}"

Respond with a JSON object with the following structure:
{{
  "action": "searchDatasets" | "getDatasetDetails" | "listOrganizations" | "getOrganizationDetails" | "listTags" | "searchDatasetsByTag" | "END",
  "keywords": "string" | null,
  "datasetId": "string" | null,
  "organizationId": "string" | null,
  "tagToSearchBy": "string" | null
}}

- Set "keywords", "datasetId", "organizationId", "tagToSearchBy" to null if not applicable to the chosen action or if the information isn't provided.
- If the user's query is ambiguous for an ID required by an action, lean towards "searchDatasets" if keywords are present, "listOrganizations" or "listTags" if relevant, or "END"."#
    )
}

/// The strict JSON shape the model is asked to return.
#[derive(Debug, Deserialize)]
struct IntentJson {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    keywords: Option<String>,
    #[serde(default, rename = "datasetId")]
    dataset_id: Option<String>,
    #[serde(default, rename = "organizationId")]
    organization_id: Option<String>,
    #[serde(default, rename = "tagToSearchBy")]
    tag_to_search_by: Option<String>,
}

/// Parse the model's intent answer.
///
/// Tries a fenced ```` ```json ```` block first, then the raw trimmed text.
fn parse_intent(raw: &str) -> Result<IntentJson, serde_json::Error> {
    let trimmed = raw.trim();
    let candidate = fenced_json(trimmed).unwrap_or(trimmed);
    serde_json::from_str(candidate)
}

fn fenced_json(text: &str) -> Option<&str> {
    let re = Regex::new(FENCED_JSON).ok()?;
    re.captures(text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

fn clean(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// The transient decision note appended to the thread for each action.
fn decision_note(action: AgentAction, params: &ExtractedParams) -> String {
    match action {
        AgentAction::SearchDatasets => params.keywords.as_ref().map_or_else(
            || generic_note(action),
            |keywords| format!("Okay, I'll search for datasets related to \"{keywords}\"."),
        ),
        AgentAction::GetDatasetDetails => params.dataset_id.as_ref().map_or_else(
            || generic_note(action),
            |id| format!("Okay, I'll get details for dataset ID \"{id}\"."),
        ),
        AgentAction::ListOrganizations => params.keywords.as_ref().map_or_else(
            || "Okay, I'll list available organizations.".to_string(),
            |keywords| format!("Okay, I'll list organizations related to \"{keywords}\"."),
        ),
        AgentAction::GetOrganizationDetails => params.organization_id.as_ref().map_or_else(
            || generic_note(action),
            |id| format!("Okay, I'll get details for organization ID \"{id}\"."),
        ),
        AgentAction::ListTags => params.keywords.as_ref().map_or_else(
            || "Okay, I'll list available tags.".to_string(),
            |keywords| format!("Okay, I'll search for tags related to \"{keywords}\"."),
        ),
        AgentAction::SearchDatasetsByTag => params.tag.as_ref().map_or_else(
            || generic_note(action),
            |tag| format!("Okay, I'll search for datasets with the tag \"{tag}\"."),
        ),
        AgentAction::End => "How can I help you further with open data today?".to_string(),
    }
}

fn generic_note(action: AgentAction) -> String {
    format!("Understood. Planning to perform action: {action}.")
}

fn extract_text(choice: &rig::OneOrMany<AssistantContent>) -> String {
    let mut out = String::new();
    for content in choice.iter() {
        if let AssistantContent::Text(text) = content {
            out.push_str(&text.text);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let raw = r#"{"action": "searchDatasets", "keywords": "water quality", "datasetId": null, "organizationId": null, "tagToSearchBy": null}"#;
        let intent = match parse_intent(raw) {
            Ok(intent) => intent,
            Err(e) => {
                assert!(false, "should parse: {e}");
                return;
            }
        };
        assert_eq!(intent.action.as_deref(), Some("searchDatasets"));
        assert_eq!(intent.keywords.as_deref(), Some("water quality"));
        assert!(intent.dataset_id.is_none());
    }

    #[test]
    fn test_parse_fenced_json() {
        let raw = "Here you go:\n```json\n{\"action\": \"listTags\", \"keywords\": null}\n```\nDone.";
        let intent = match parse_intent(raw) {
            Ok(intent) => intent,
            Err(e) => {
                assert!(false, "should parse: {e}");
                return;
            }
        };
        assert_eq!(intent.action.as_deref(), Some("listTags"));
    }

    #[test]
    fn test_parse_fenced_without_language_tag() {
        let raw = "```\n{\"action\": \"END\"}\n```";
        let intent = match parse_intent(raw) {
            Ok(intent) => intent,
            Err(e) => {
                assert!(false, "should parse: {e}");
                return;
            }
        };
        assert_eq!(intent.action.as_deref(), Some("END"));
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(parse_intent("I'd rather chat about the weather.").is_err());
    }

    #[test]
    fn test_unknown_action_coerces_to_end() {
        let action = AgentAction::from_wire("makeCoffee");
        assert_eq!(action, AgentAction::End);
    }

    #[test]
    fn test_decision_note_for_search() {
        let params = ExtractedParams {
            keywords: Some("parks".to_string()),
            ..ExtractedParams::default()
        };
        let note = decision_note(AgentAction::SearchDatasets, &params);
        assert_eq!(note, "Okay, I'll search for datasets related to \"parks\".");
    }

    #[test]
    fn test_decision_note_for_end_is_follow_up_prompt() {
        let note = decision_note(AgentAction::End, &ExtractedParams::default());
        assert!(note.contains("How can I help"));
    }

    #[test]
    fn test_clean_drops_blank_params() {
        assert_eq!(clean(Some("  ".to_string())), None);
        assert_eq!(clean(Some("x".to_string())), Some("x".to_string()));
        assert_eq!(clean(None), None);
    }

    #[test]
    fn test_instructions_embed_user_text() {
        let instructions = intent_instructions("find housing data");
        assert!(instructions.contains("find housing data"));
        assert!(instructions.contains("searchDatasetsByTag"));
    }
}
