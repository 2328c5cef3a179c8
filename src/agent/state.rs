//! Conversation state for the agent turn pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ckan::{DatasetDetails, DatasetSummary, OrganizationDetails, OrganizationSummary};

/// Who produced a message.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user.
    User,
    /// The agent.
    Assistant,
    /// A tool result surfaced into the thread.
    Tool,
}

/// How a message should be presented.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageDisplay {
    /// A regular thread message.
    #[default]
    Normal,
    /// A transient decision note the host may collapse.
    Thinking,
}

/// One role-tagged message in the conversation thread.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Stable message id.
    pub id: Uuid,
    /// Who produced the message.
    pub role: Role,
    /// Text content.
    pub content: String,
    /// Presentation hint.
    #[serde(default)]
    pub display: MessageDisplay,
    /// When the message was created.
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>, display: MessageDisplay) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            display,
            created_at: Utc::now(),
        }
    }

    /// Build a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content, MessageDisplay::Normal)
    }

    /// Build a regular assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content, MessageDisplay::Normal)
    }

    /// Build a transient assistant decision note.
    #[must_use]
    pub fn thinking(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content, MessageDisplay::Thinking)
    }
}

/// The closed set of actions the agent can take in a turn.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum AgentAction {
    /// Keyword dataset search.
    #[serde(rename = "searchDatasets")]
    SearchDatasets,
    /// Single-dataset detail fetch.
    #[serde(rename = "getDatasetDetails")]
    GetDatasetDetails,
    /// Organization listing.
    #[serde(rename = "listOrganizations")]
    ListOrganizations,
    /// Single-organization detail fetch.
    #[serde(rename = "getOrganizationDetails")]
    GetOrganizationDetails,
    /// Tag listing.
    #[serde(rename = "listTags")]
    ListTags,
    /// Tag-filtered dataset search.
    #[serde(rename = "searchDatasetsByTag")]
    SearchDatasetsByTag,
    /// No tool action; the turn ends after responding.
    #[default]
    #[serde(rename = "END")]
    End,
}

impl AgentAction {
    /// Parse a wire action name, coercing anything unrecognized to [`Self::End`].
    #[must_use]
    pub fn from_wire(name: &str) -> Self {
        match name {
            "searchDatasets" => Self::SearchDatasets,
            "getDatasetDetails" => Self::GetDatasetDetails,
            "listOrganizations" => Self::ListOrganizations,
            "getOrganizationDetails" => Self::GetOrganizationDetails,
            "listTags" => Self::ListTags,
            "searchDatasetsByTag" => Self::SearchDatasetsByTag,
            _ => Self::End,
        }
    }

    /// The wire name of this action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SearchDatasets => "searchDatasets",
            Self::GetDatasetDetails => "getDatasetDetails",
            Self::ListOrganizations => "listOrganizations",
            Self::GetOrganizationDetails => "getOrganizationDetails",
            Self::ListTags => "listTags",
            Self::SearchDatasetsByTag => "searchDatasetsByTag",
            Self::End => "END",
        }
    }
}

impl std::fmt::Display for AgentAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters the classifier extracted for the chosen action.
///
/// Only the fields relevant to the action are populated; the rest stay
/// `None`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExtractedParams {
    /// Search keywords (dataset search, organization/tag filtering).
    pub keywords: Option<String>,
    /// Dataset name or id (detail fetch).
    pub dataset_id: Option<String>,
    /// Organization name or id (detail fetch).
    pub organization_id: Option<String>,
    /// Tag name (tag-filtered search).
    pub tag: Option<String>,
}

/// Per-turn aggregate the state machine runs over.
///
/// Created once per incoming user message, seeded from the prior turn's
/// thread, mutated through exactly one pass of the machine, and handed
/// back to the caller. Messages are append-only within a turn.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConversationState {
    /// Ordered conversation thread.
    pub messages: Vec<Message>,
    /// Raw text of the incoming user message.
    pub user_input: Option<String>,
    /// The action chosen for this turn; defaults to [`AgentAction::End`].
    pub next_action: AgentAction,
    /// Parameters the classifier extracted.
    pub extracted: ExtractedParams,
    /// Results of the most recent dataset search.
    pub search_results: Option<Vec<DatasetSummary>>,
    /// The most recently fetched dataset details.
    pub dataset_details: Option<DatasetDetails>,
    /// Results of the most recent organization listing.
    pub organizations: Option<Vec<OrganizationSummary>>,
    /// The most recently fetched organization details.
    pub organization_details: Option<OrganizationDetails>,
    /// Results of the most recent tag listing.
    pub tags: Option<Vec<String>>,
    /// Human-readable description of the most recent result.
    pub last_summary: Option<String>,
    /// Terminal error description; once set, the turn short-circuits.
    pub error: Option<String>,
}

impl ConversationState {
    /// Start a turn from prior thread history plus the new user message.
    #[must_use]
    pub fn resume(mut history: Vec<Message>, user_text: impl Into<String>) -> Self {
        let user_text = user_text.into();
        history.push(Message::user(user_text.clone()));
        Self {
            messages: history,
            user_input: Some(user_text),
            ..Self::default()
        }
    }

    /// Text of the most recent user message, if any.
    #[must_use]
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    /// Merge a node's partial patch into the running state.
    ///
    /// Patch messages are appended; other fields overwrite only when the
    /// patch carries them.
    pub fn apply(&mut self, patch: StatePatch) {
        self.messages.extend(patch.messages);
        if let Some(action) = patch.next_action {
            self.next_action = action;
        }
        if let Some(extracted) = patch.extracted {
            self.extracted = extracted;
        }
        if let Some(results) = patch.search_results {
            self.search_results = Some(results);
        }
        if let Some(details) = patch.dataset_details {
            self.dataset_details = Some(details);
        }
        if let Some(organizations) = patch.organizations {
            self.organizations = Some(organizations);
        }
        if let Some(details) = patch.organization_details {
            self.organization_details = Some(details);
        }
        if let Some(tags) = patch.tags {
            self.tags = Some(tags);
        }
        if let Some(summary) = patch.last_summary {
            self.last_summary = Some(summary);
        }
        if let Some(error) = patch.error {
            self.error = Some(error);
        }
    }
}

/// A partial state update returned by the classifier and the action nodes.
///
/// Nodes fill only the fields they changed; the state machine merges.
#[derive(Debug, Default)]
pub struct StatePatch {
    /// Messages to append to the thread.
    pub messages: Vec<Message>,
    /// New action, when the patch changes routing.
    pub next_action: Option<AgentAction>,
    /// New extracted parameters.
    pub extracted: Option<ExtractedParams>,
    /// New dataset search results.
    pub search_results: Option<Vec<DatasetSummary>>,
    /// New dataset details.
    pub dataset_details: Option<DatasetDetails>,
    /// New organization listing.
    pub organizations: Option<Vec<OrganizationSummary>>,
    /// New organization details.
    pub organization_details: Option<OrganizationDetails>,
    /// New tag listing.
    pub tags: Option<Vec<String>>,
    /// New result summary.
    pub last_summary: Option<String>,
    /// Terminal error description.
    pub error: Option<String>,
}

impl StatePatch {
    /// Build a terminal error patch carrying a user-facing assistant message.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            messages: vec![Message::assistant(message.clone())],
            next_action: Some(AgentAction::End),
            error: Some(message),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_action_coerces_to_end() {
        assert_eq!(AgentAction::from_wire("launchRockets"), AgentAction::End);
        assert_eq!(AgentAction::from_wire(""), AgentAction::End);
    }

    #[test]
    fn test_known_actions_parse() {
        assert_eq!(
            AgentAction::from_wire("searchDatasets"),
            AgentAction::SearchDatasets
        );
        assert_eq!(
            AgentAction::from_wire("searchDatasetsByTag"),
            AgentAction::SearchDatasetsByTag
        );
    }

    #[test]
    fn test_resume_appends_user_message() {
        let state = ConversationState::resume(vec![], "find parks data");
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.last_user_text(), Some("find parks data"));
        assert_eq!(state.next_action, AgentAction::End);
    }

    #[test]
    fn test_apply_appends_messages_and_merges_fields() {
        let mut state = ConversationState::resume(vec![], "hello");
        let patch = StatePatch {
            messages: vec![Message::assistant("hi")],
            next_action: Some(AgentAction::SearchDatasets),
            last_summary: Some("summary".to_string()),
            ..StatePatch::default()
        };
        state.apply(patch);

        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.next_action, AgentAction::SearchDatasets);
        assert_eq!(state.last_summary.as_deref(), Some("summary"));
        // Untouched fields stay put.
        assert!(state.search_results.is_none());
        assert!(state.error.is_none());
    }

    #[test]
    fn test_error_patch_is_terminal_and_visible() {
        let patch = StatePatch::error("something went wrong");
        assert_eq!(patch.next_action, Some(AgentAction::End));
        assert_eq!(patch.messages.len(), 1);
        assert_eq!(patch.messages[0].role, Role::Assistant);
        assert_eq!(patch.error.as_deref(), Some("something went wrong"));
    }
}
