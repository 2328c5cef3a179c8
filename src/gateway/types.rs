//! Wire types for the tool gateway boundary.
//!
//! The request/response shapes mirror a model-context-protocol tool call:
//! a named tool plus a JSON argument object in, and either a content array
//! whose first part carries a JSON string, or a bare string, out.

use serde::{Deserialize, Serialize};

/// The closed vocabulary of tools the gateway serves.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ToolName {
    /// Keyword dataset search.
    SearchDatasets,
    /// Single-dataset detail fetch.
    GetDatasetDetails,
    /// Organization listing.
    ListOrganizations,
    /// Single-organization detail fetch.
    GetOrganizationDetails,
    /// Tag listing.
    ListTags,
    /// Tag-filtered dataset search.
    SearchDatasetsByTag,
}

impl ToolName {
    /// The wire name of this tool.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SearchDatasets => "searchDatasets",
            Self::GetDatasetDetails => "getDatasetDetails",
            Self::ListOrganizations => "listOrganizations",
            Self::GetOrganizationDetails => "getOrganizationDetails",
            Self::ListTags => "listTags",
            Self::SearchDatasetsByTag => "searchDatasetsByTag",
        }
    }

    /// Parse a wire name, returning `None` for anything outside the vocabulary.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "searchDatasets" => Some(Self::SearchDatasets),
            "getDatasetDetails" => Some(Self::GetDatasetDetails),
            "listOrganizations" => Some(Self::ListOrganizations),
            "getOrganizationDetails" => Some(Self::GetOrganizationDetails),
            "listTags" => Some(Self::ListTags),
            "searchDatasetsByTag" => Some(Self::SearchDatasetsByTag),
            _ => None,
        }
    }
}

/// One call to the gateway: tool name plus argument object.
///
/// Constructed per call and never retained after the call returns.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolRequest {
    /// Wire name of the tool to invoke.
    pub name: String,
    /// JSON argument object for the tool.
    pub arguments: serde_json::Value,
}

impl ToolRequest {
    /// Build a request for a known tool.
    #[must_use]
    pub fn new(name: ToolName, arguments: serde_json::Value) -> Self {
        Self {
            name: name.as_str().to_string(),
            arguments,
        }
    }
}

/// One part of a structured tool response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContentPart {
    /// Part kind; the gateway emits `"text"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Payload carried by the part.
    pub text: String,
}

impl ContentPart {
    /// Build a text part carrying a JSON payload string.
    #[must_use]
    pub fn text(payload: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: payload.into(),
        }
    }
}

/// A tool response as it crosses the gateway boundary.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolResponse {
    /// Structured content array; the first text part carries the payload.
    Content {
        /// The response parts.
        content: Vec<ContentPart>,
    },
    /// A bare string payload.
    Text(String),
}

impl ToolResponse {
    /// Extract the string payload, if this response is in a consumable shape.
    ///
    /// Returns `None` when the content array is empty or its first part is
    /// not a text part; callers treat that as a gateway contract violation.
    #[must_use]
    pub fn payload(&self) -> Option<&str> {
        match self {
            Self::Content { content } => content
                .first()
                .filter(|part| part.kind == "text")
                .map(|part| part.text.as_str()),
            Self::Text(text) => Some(text.as_str()),
        }
    }
}

/// Arguments for [`ToolName::SearchDatasets`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchDatasetsArgs {
    /// Search keywords or query string.
    pub query: String,
    /// Page size, clamped to `1..=100` downstream.
    #[serde(default)]
    pub rows: Option<u32>,
    /// Pagination offset.
    #[serde(default)]
    pub start: Option<u32>,
}

/// Arguments for [`ToolName::GetDatasetDetails`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GetDatasetDetailsArgs {
    /// Dataset name or id.
    pub id: String,
}

/// Arguments for [`ToolName::ListOrganizations`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ListOrganizationsArgs {
    /// Optional filter string.
    #[serde(default)]
    pub query: Option<String>,
}

/// Arguments for [`ToolName::GetOrganizationDetails`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GetOrganizationDetailsArgs {
    /// Organization name or id.
    pub id: String,
}

/// Arguments for [`ToolName::ListTags`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ListTagsArgs {
    /// Optional tag search string.
    #[serde(default)]
    pub query: Option<String>,
}

/// Arguments for [`ToolName::SearchDatasetsByTag`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchDatasetsByTagArgs {
    /// The tag to filter datasets by.
    pub tag: String,
    /// Page size, clamped to `1..=100` downstream.
    #[serde(default)]
    pub rows: Option<u32>,
    /// Pagination offset.
    #[serde(default)]
    pub start: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_name_round_trip() {
        for name in [
            ToolName::SearchDatasets,
            ToolName::GetDatasetDetails,
            ToolName::ListOrganizations,
            ToolName::GetOrganizationDetails,
            ToolName::ListTags,
            ToolName::SearchDatasetsByTag,
        ] {
            assert_eq!(ToolName::parse(name.as_str()), Some(name));
        }
    }

    #[test]
    fn test_unknown_tool_name_rejected() {
        assert_eq!(ToolName::parse("dropTables"), None);
        assert_eq!(ToolName::parse(""), None);
    }

    #[test]
    fn test_payload_from_content_array() {
        let response = ToolResponse::Content {
            content: vec![ContentPart::text(r#"{"count":0,"results":[]}"#)],
        };
        assert_eq!(response.payload(), Some(r#"{"count":0,"results":[]}"#));
    }

    #[test]
    fn test_payload_from_bare_string() {
        let response = ToolResponse::Text("{}".to_string());
        assert_eq!(response.payload(), Some("{}"));
    }

    #[test]
    fn test_payload_rejects_empty_content() {
        let response = ToolResponse::Content { content: vec![] };
        assert_eq!(response.payload(), None);
    }

    #[test]
    fn test_payload_rejects_non_text_part() {
        let response = ToolResponse::Content {
            content: vec![ContentPart {
                kind: "image".to_string(),
                text: "not a payload".to_string(),
            }],
        };
        assert_eq!(response.payload(), None);
    }

    #[test]
    fn test_content_response_wire_shape() {
        let response = ToolResponse::Content {
            content: vec![ContentPart::text("{}")],
        };
        let json = serde_json::to_value(&response).ok();
        assert_eq!(
            json,
            Some(serde_json::json!({"content": [{"type": "text", "text": "{}"}]}))
        );
    }
}
