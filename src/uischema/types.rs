//! Declarative UI schema types.
//!
//! A [`UiSchema`] is independent of any specific record type: it pairs a
//! flat key→value data bag with a layout description (header, tabs,
//! sections, typed fields, actions). The JSON shape is the stable contract
//! between the agent/tool layer and the presentation layer, so field names
//! serialize in camelCase.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A value in the schema data bag.
///
/// Closed variant set; record assemblers map arbitrary upstream values
/// into one of these instead of carrying an open-typed bag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Absent / null.
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// Text value.
    Text(String),
}

impl FieldValue {
    /// Whether the value is null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Truthiness used for boolean formatting.
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0,
            Self::Text(s) => !s.is_empty(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        Self::Number(value as f64)
    }
}

impl<T> From<Option<T>> for FieldValue
where
    T: Into<Self>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// What kind of view a schema describes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    /// A record detail view.
    Detail,
    /// A tabular listing.
    Table,
    /// An input form.
    Form,
}

/// Typed field semantics; the type alone determines formatting.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Plain text.
    Text,
    /// Numeric display.
    Number,
    /// Locale-formatted date.
    Date,
    /// Localized currency amount.
    Currency,
    /// Multi-line text.
    Textarea,
    /// Choice out of `options`.
    Dropdown,
    /// File reference.
    File,
    /// Yes/No flag.
    Boolean,
    /// Email address, rendered as a link.
    Email,
    /// Phone number.
    Phone,
    /// Hyperlink.
    Url,
    /// Colored status pill.
    Status,
    /// Neutral badge.
    Badge,
}

/// Section field arrangement.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionLayout {
    /// Multi-column grid.
    Grid,
    /// Vertical list.
    #[default]
    List,
    /// Inline flow.
    Inline,
}

/// Visual weight of an action button.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Primary call to action.
    Primary,
    /// Secondary action.
    Secondary,
    /// Destructive action.
    Danger,
    /// Link-styled action.
    Link,
}

/// One selectable option of a dropdown field.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldOption {
    /// Stored value.
    pub value: String,
    /// Display label.
    pub label: String,
}

/// Formatting hints for a field.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldFormat {
    /// Text prepended to the value.
    pub prefix: Option<String>,
    /// Text appended to the value.
    pub suffix: Option<String>,
    /// Date format hint.
    pub date_format: Option<String>,
    /// ISO currency code.
    pub currency: Option<String>,
}

/// Display hints for a field.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDisplay {
    /// Preferred width.
    pub width: Option<String>,
    /// Text color.
    pub color: Option<String>,
    /// Background color.
    pub background_color: Option<String>,
    /// Icon name or glyph.
    pub icon: Option<String>,
}

/// One typed field of a section.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiField {
    /// Key into the schema data bag.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Field semantics; determines formatting.
    #[serde(rename = "type")]
    pub kind: FieldType,
    /// Whether the field is marked required (visual marker only).
    #[serde(default)]
    pub required: bool,
    /// Text shown when the key does not resolve in the data bag.
    pub placeholder: Option<String>,
    /// Options for dropdown fields.
    pub options: Option<Vec<FieldOption>>,
    /// Formatting hints.
    pub format: Option<FieldFormat>,
    /// Display hints.
    pub display: Option<FieldDisplay>,
}

impl UiField {
    /// Build a field with the given key, label, and type.
    #[must_use]
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: FieldType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind,
            required: false,
            placeholder: None,
            options: None,
            format: None,
            display: None,
        }
    }
}

/// Confirmation prompt attached to an action.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionConfirmation {
    /// Prompt title.
    pub title: String,
    /// Prompt message.
    pub message: String,
}

/// One action button.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UiAction {
    /// Stable action id handed back to the host on invocation.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Visual weight.
    #[serde(rename = "type")]
    pub kind: ActionKind,
    /// Icon name or glyph.
    pub icon: Option<String>,
    /// Whether the action is disabled.
    #[serde(default)]
    pub disabled: bool,
    /// Optional confirmation prompt.
    pub confirmation: Option<ActionConfirmation>,
}

impl UiAction {
    /// Build an enabled action without icon or confirmation.
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: ActionKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            icon: None,
            disabled: false,
            confirmation: None,
        }
    }
}

/// One titled group of fields.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiSection {
    /// Section title.
    pub title: String,
    /// Optional help text.
    pub description: Option<String>,
    /// Fields rendered against the schema data bag.
    pub fields: Vec<UiField>,
    /// Field arrangement.
    #[serde(default)]
    pub layout: SectionLayout,
    /// Column count for grid layout.
    pub columns: Option<u32>,
    /// Whether the section can be collapsed.
    #[serde(default)]
    pub collapsible: bool,
    /// Whether a collapsible section starts expanded (defaults to true).
    pub default_expanded: Option<bool>,
    /// Section-level actions.
    pub actions: Option<Vec<UiAction>>,
}

/// One tab grouping sections.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UiTab {
    /// Stable tab id.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Optional count shown next to the label.
    pub count: Option<u64>,
    /// Sections of the tab.
    pub sections: Vec<UiSection>,
    /// Tab-level actions.
    pub actions: Option<Vec<UiAction>>,
}

/// One header metadata entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UiMetadata {
    /// Entry label.
    pub label: String,
    /// Entry value.
    pub value: String,
    /// How the value is presented.
    #[serde(rename = "type")]
    pub kind: Option<MetadataKind>,
    /// Icon name or glyph.
    pub icon: Option<String>,
}

/// Presentation of a header metadata entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataKind {
    /// Plain text.
    Text,
    /// Hyperlink.
    Link,
    /// Date.
    Date,
    /// Neutral badge.
    Badge,
    /// Status dot plus label.
    Status,
}

/// Header status indicator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UiStatus {
    /// Status label.
    pub label: String,
    /// Status color.
    pub color: String,
    /// Icon name or glyph.
    pub icon: Option<String>,
}

/// View header.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UiHeader {
    /// Main title.
    pub title: String,
    /// Optional subtitle.
    pub subtitle: Option<String>,
    /// Optional status indicator.
    pub status: Option<UiStatus>,
    /// Ordered metadata entries.
    pub metadata: Vec<UiMetadata>,
    /// Header-level actions.
    pub actions: Option<Vec<UiAction>>,
}

/// A complete declarative view description plus its data bag.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiSchema {
    /// What kind of view this is.
    #[serde(rename = "type")]
    pub kind: SchemaKind,
    /// Optional header.
    pub header: Option<UiHeader>,
    /// Tabs; when present, only the active tab's sections render.
    pub tabs: Option<Vec<UiTab>>,
    /// Top-level sections, rendered when no tabs are present.
    pub sections: Option<Vec<UiSection>>,
    /// Schema-level actions.
    pub actions: Option<Vec<UiAction>>,
    /// Flat key→value bag the fields resolve against.
    pub data: BTreeMap<String, FieldValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_from_option() {
        assert_eq!(FieldValue::from(None::<String>), FieldValue::Null);
        assert_eq!(
            FieldValue::from(Some("x".to_string())),
            FieldValue::Text("x".to_string())
        );
    }

    #[test]
    fn test_field_value_truthiness() {
        assert!(!FieldValue::Null.truthy());
        assert!(!FieldValue::Bool(false).truthy());
        assert!(FieldValue::Bool(true).truthy());
        assert!(!FieldValue::Number(0.0).truthy());
        assert!(FieldValue::Number(2.0).truthy());
        assert!(!FieldValue::Text(String::new()).truthy());
        assert!(FieldValue::Text("yes".to_string()).truthy());
    }

    #[test]
    fn test_field_value_json_round_trip() {
        let values = vec![
            FieldValue::Null,
            FieldValue::Bool(true),
            FieldValue::Number(12.5),
            FieldValue::Text("hello".to_string()),
        ];
        let json = serde_json::to_string(&values).unwrap_or_default();
        assert_eq!(json, r#"[null,true,12.5,"hello"]"#);
        let back: Result<Vec<FieldValue>, _> = serde_json::from_str(&json);
        assert!(matches!(back, Ok(v) if v == values));
    }

    #[test]
    fn test_field_type_wire_names() {
        let json = serde_json::to_string(&FieldType::Textarea).unwrap_or_default();
        assert_eq!(json, r#""textarea""#);
        let json = serde_json::to_string(&FieldType::Status).unwrap_or_default();
        assert_eq!(json, r#""status""#);
    }

    #[test]
    fn test_schema_field_serializes_type_key() {
        let field = UiField::new("status", "Status", FieldType::Status);
        let json = serde_json::to_value(&field).unwrap_or_default();
        assert_eq!(json.get("type"), Some(&serde_json::json!("status")));
        assert_eq!(json.get("key"), Some(&serde_json::json!("status")));
    }
}
