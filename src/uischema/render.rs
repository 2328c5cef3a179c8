//! Dynamic schema renderer.
//!
//! Walks a [`UiSchema`] and produces a [`RenderedView`] tree with every
//! value already formatted according to its field type. Rendering is a
//! deterministic function of the schema plus two pieces of view-local
//! state: the active tab and per-section expansion. Both reset whenever a
//! new renderer is constructed for a new schema; nothing persists across
//! unrelated records.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::uischema::types::{
    ActionKind, FieldType, FieldValue, SectionLayout, UiAction, UiField, UiHeader, UiMetadata,
    UiSchema, UiSection, MetadataKind,
};

/// Fallback text for a field whose key does not resolve in the data bag.
pub const NOT_SPECIFIED: &str = "Not specified";

/// Default column count for grid sections.
const DEFAULT_GRID_COLUMNS: u32 = 2;

/// Semantic color of a pill or badge.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Positive state (active, approved).
    Success,
    /// Attention state (pending).
    Warning,
    /// Negative state (rejected, denied).
    Danger,
    /// Anything else.
    Neutral,
}

impl Tone {
    /// The color assigned to this tone.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Success => "#10b981",
            Self::Warning => "#f59e0b",
            Self::Danger => "#ef4444",
            Self::Neutral => "#6b7280",
        }
    }
}

/// Map a status string to its tone, case-insensitively.
#[must_use]
pub fn status_tone(value: &str) -> Tone {
    match value.to_lowercase().as_str() {
        "active" | "approved" => Tone::Success,
        "pending" => Tone::Warning,
        "rejected" | "denied" => Tone::Danger,
        _ => Tone::Neutral,
    }
}

/// A fully formatted view tree.
#[derive(Clone, Debug, Serialize)]
pub struct RenderedView {
    /// Formatted header, when the schema has one.
    pub header: Option<RenderedHeader>,
    /// Tab strip handles; empty when the schema has no tabs.
    pub tabs: Vec<RenderedTab>,
    /// Actions of the active tab.
    pub tab_actions: Vec<RenderedAction>,
    /// The visible sections: the active tab's, or the schema's own.
    pub sections: Vec<RenderedSection>,
    /// Schema-level actions.
    pub actions: Vec<RenderedAction>,
}

/// Formatted header.
#[derive(Clone, Debug, Serialize)]
pub struct RenderedHeader {
    /// Main title.
    pub title: String,
    /// Optional subtitle.
    pub subtitle: Option<String>,
    /// Optional status badge.
    pub status: Option<RenderedBadge>,
    /// Formatted metadata entries.
    pub metadata: Vec<RenderedMetadata>,
}

/// A colored label.
#[derive(Clone, Debug, Serialize)]
pub struct RenderedBadge {
    /// Badge text.
    pub label: String,
    /// Badge color.
    pub color: String,
}

/// One formatted header metadata entry.
#[derive(Clone, Debug, Serialize)]
pub struct RenderedMetadata {
    /// Entry label.
    pub label: String,
    /// Formatted value text.
    pub text: String,
    /// Whether the entry renders as a link.
    pub link: bool,
}

/// One tab strip handle.
#[derive(Clone, Debug, Serialize)]
pub struct RenderedTab {
    /// Tab id.
    pub id: String,
    /// Tab label.
    pub label: String,
    /// Optional count shown next to the label.
    pub count: Option<u64>,
    /// Whether this tab is the active one.
    pub active: bool,
}

/// One formatted section.
#[derive(Clone, Debug, Serialize)]
pub struct RenderedSection {
    /// Section title.
    pub title: String,
    /// Optional help text.
    pub description: Option<String>,
    /// Field arrangement.
    pub layout: SectionLayout,
    /// Effective column count.
    pub columns: u32,
    /// Whether the section can be collapsed.
    pub collapsible: bool,
    /// Whether the section is currently expanded.
    pub expanded: bool,
    /// Formatted fields; empty while the section is collapsed.
    pub fields: Vec<RenderedField>,
    /// Section-level actions.
    pub actions: Vec<RenderedAction>,
}

/// One formatted field.
#[derive(Clone, Debug, Serialize)]
pub struct RenderedField {
    /// Data bag key.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Whether the required marker is shown.
    pub required: bool,
    /// Formatted value text.
    pub text: String,
    /// How the value is presented.
    pub control: FieldControl,
}

/// Presentation of a formatted field value.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldControl {
    /// Plain text.
    Plain,
    /// Colored pill.
    Pill {
        /// Semantic tone.
        tone: Tone,
        /// Resolved color.
        color: String,
    },
    /// Hyperlink.
    Link {
        /// Link target.
        href: String,
    },
}

/// One action button.
#[derive(Clone, Debug, Serialize)]
pub struct RenderedAction {
    /// Action id handed back to the host on invocation.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Visual weight.
    pub kind: ActionKind,
    /// Whether the button is disabled.
    pub disabled: bool,
}

/// The payload handed to the host when an action is invoked.
#[derive(Clone, Debug, Serialize)]
pub struct ActionInvocation {
    /// The invoked action id.
    pub action_id: String,
    /// The schema's current data bag.
    pub data: BTreeMap<String, FieldValue>,
}

/// Stateful view over one schema.
pub struct Renderer {
    schema: UiSchema,
    active_tab: Option<String>,
    expanded: HashMap<String, bool>,
}

impl Renderer {
    /// Create a renderer for a schema; the first tab starts active.
    #[must_use]
    pub fn new(schema: UiSchema) -> Self {
        let active_tab = schema
            .tabs
            .as_ref()
            .and_then(|tabs| tabs.first())
            .map(|tab| tab.id.clone());
        Self {
            schema,
            active_tab,
            expanded: HashMap::new(),
        }
    }

    /// The schema this renderer was built over.
    #[must_use]
    pub const fn schema(&self) -> &UiSchema {
        &self.schema
    }

    /// Id of the active tab, if the schema has tabs.
    #[must_use]
    pub fn active_tab(&self) -> Option<&str> {
        self.active_tab.as_deref()
    }

    /// Switch the active tab. A pure local-state update; returns false and
    /// leaves the state untouched when the id names no tab.
    pub fn select_tab(&mut self, id: &str) -> bool {
        let known = self
            .schema
            .tabs
            .as_ref()
            .is_some_and(|tabs| tabs.iter().any(|tab| tab.id == id));
        if known {
            self.active_tab = Some(id.to_string());
        }
        known
    }

    /// Toggle a collapsible section's expansion.
    ///
    /// `tab_id` is `None` for top-level sections. Non-collapsible sections
    /// are left alone.
    pub fn toggle_section(&mut self, tab_id: Option<&str>, index: usize) {
        let Some(section) = self.find_section(tab_id, index) else {
            return;
        };
        if !section.collapsible {
            return;
        }
        let default_expanded = section.default_expanded.unwrap_or(true);
        let key = section_key(tab_id, index);
        let current = self.expanded.get(&key).copied().unwrap_or(default_expanded);
        let _ = self.expanded.insert(key, !current);
    }

    /// Produce the formatted view tree for the current local state.
    #[must_use]
    pub fn render(&self) -> RenderedView {
        let header = self.schema.header.as_ref().map(render_header);

        let mut tabs = Vec::new();
        let mut tab_actions = Vec::new();
        let mut sections = Vec::new();

        let schema_tabs = self.schema.tabs.as_deref().unwrap_or(&[]);
        if schema_tabs.is_empty() {
            if let Some(schema_sections) = &self.schema.sections {
                sections = schema_sections
                    .iter()
                    .enumerate()
                    .map(|(index, section)| self.render_section(section, None, index))
                    .collect();
            }
        } else {
            for tab in schema_tabs {
                tabs.push(RenderedTab {
                    id: tab.id.clone(),
                    label: tab.label.clone(),
                    count: tab.count,
                    active: self.active_tab.as_deref() == Some(tab.id.as_str()),
                });
            }
            if let Some(active) = schema_tabs
                .iter()
                .find(|tab| self.active_tab.as_deref() == Some(tab.id.as_str()))
            {
                tab_actions = render_actions(active.actions.as_deref());
                sections = active
                    .sections
                    .iter()
                    .enumerate()
                    .map(|(index, section)| {
                        self.render_section(section, Some(active.id.as_str()), index)
                    })
                    .collect();
            }
        }

        RenderedView {
            header,
            tabs,
            tab_actions,
            sections,
            actions: render_actions(self.schema.actions.as_deref()),
        }
    }

    /// Resolve an action id anywhere in the schema into an invocation
    /// payload. The renderer performs nothing itself; the host decides
    /// what the action means.
    #[must_use]
    pub fn action_payload(&self, action_id: &str) -> Option<ActionInvocation> {
        if self.find_action(action_id).is_some() {
            Some(ActionInvocation {
                action_id: action_id.to_string(),
                data: self.schema.data.clone(),
            })
        } else {
            None
        }
    }

    fn find_action(&self, action_id: &str) -> Option<&UiAction> {
        fn in_list<'a>(actions: Option<&'a [UiAction]>, action_id: &str) -> Option<&'a UiAction> {
            actions.and_then(|actions| actions.iter().find(|action| action.id == action_id))
        }

        if let Some(action) = in_list(self.schema.actions.as_deref(), action_id) {
            return Some(action);
        }
        if let Some(action) = in_list(
            self.schema.header.as_ref().and_then(|h| h.actions.as_deref()),
            action_id,
        ) {
            return Some(action);
        }
        for tab in self.schema.tabs.as_deref().unwrap_or(&[]) {
            if let Some(action) = in_list(tab.actions.as_deref(), action_id) {
                return Some(action);
            }
            for section in &tab.sections {
                if let Some(action) = in_list(section.actions.as_deref(), action_id) {
                    return Some(action);
                }
            }
        }
        for section in self.schema.sections.as_deref().unwrap_or(&[]) {
            if let Some(action) = in_list(section.actions.as_deref(), action_id) {
                return Some(action);
            }
        }
        None
    }

    fn find_section(&self, tab_id: Option<&str>, index: usize) -> Option<&UiSection> {
        match tab_id {
            Some(tab_id) => self
                .schema
                .tabs
                .as_deref()
                .unwrap_or(&[])
                .iter()
                .find(|tab| tab.id == tab_id)
                .and_then(|tab| tab.sections.get(index)),
            None => self
                .schema
                .sections
                .as_deref()
                .and_then(|sections| sections.get(index)),
        }
    }

    fn render_section(
        &self,
        section: &UiSection,
        tab_id: Option<&str>,
        index: usize,
    ) -> RenderedSection {
        let expanded = if section.collapsible {
            let key = section_key(tab_id, index);
            self.expanded
                .get(&key)
                .copied()
                .unwrap_or_else(|| section.default_expanded.unwrap_or(true))
        } else {
            true
        };

        let fields = if expanded {
            section
                .fields
                .iter()
                .map(|field| render_field(field, &self.schema.data))
                .collect()
        } else {
            Vec::new()
        };

        let columns = match section.layout {
            SectionLayout::Grid => section.columns.unwrap_or(DEFAULT_GRID_COLUMNS),
            SectionLayout::List | SectionLayout::Inline => 1,
        };

        RenderedSection {
            title: section.title.clone(),
            description: section.description.clone(),
            layout: section.layout,
            columns,
            collapsible: section.collapsible,
            expanded,
            fields,
            actions: render_actions(section.actions.as_deref()),
        }
    }
}

fn section_key(tab_id: Option<&str>, index: usize) -> String {
    format!("{}/{index}", tab_id.unwrap_or(""))
}

fn render_header(header: &UiHeader) -> RenderedHeader {
    RenderedHeader {
        title: header.title.clone(),
        subtitle: header.subtitle.clone(),
        status: header.status.as_ref().map(|status| RenderedBadge {
            label: status.label.clone(),
            color: status.color.clone(),
        }),
        metadata: header.metadata.iter().map(render_metadata).collect(),
    }
}

fn render_metadata(entry: &UiMetadata) -> RenderedMetadata {
    let text = match entry.kind {
        Some(MetadataKind::Date) => format_date(&entry.value),
        _ => entry.value.clone(),
    };
    RenderedMetadata {
        label: entry.label.clone(),
        text,
        link: entry.kind == Some(MetadataKind::Link),
    }
}

fn render_actions(actions: Option<&[UiAction]>) -> Vec<RenderedAction> {
    actions
        .unwrap_or(&[])
        .iter()
        .map(|action| RenderedAction {
            id: action.id.clone(),
            label: action.label.clone(),
            kind: action.kind,
            disabled: action.disabled,
        })
        .collect()
}

fn render_field(field: &UiField, data: &BTreeMap<String, FieldValue>) -> RenderedField {
    let value = data.get(&field.key).filter(|value| !value.is_null());
    let text = format_value(field, value);

    let control = match field.kind {
        FieldType::Status => {
            let tone = value.map_or(Tone::Neutral, |value| status_tone(&raw_text(value)));
            FieldControl::Pill {
                tone,
                color: tone.color().to_string(),
            }
        }
        FieldType::Badge => FieldControl::Pill {
            tone: Tone::Neutral,
            color: Tone::Neutral.color().to_string(),
        },
        FieldType::Boolean => {
            let tone = if value.is_some_and(FieldValue::truthy) {
                Tone::Success
            } else {
                Tone::Danger
            };
            FieldControl::Pill {
                tone,
                color: tone.color().to_string(),
            }
        }
        FieldType::Url => value.map_or(FieldControl::Plain, |value| FieldControl::Link {
            href: raw_text(value),
        }),
        FieldType::Email => value.map_or(FieldControl::Plain, |value| FieldControl::Link {
            href: format!("mailto:{}", raw_text(value)),
        }),
        _ => FieldControl::Plain,
    };

    RenderedField {
        key: field.key.clone(),
        label: field.label.clone(),
        required: field.required,
        text,
        control,
    }
}

/// Format a field value according to the field's type.
///
/// A missing or null value falls back to the field placeholder, or
/// [`NOT_SPECIFIED`]; this function never fails.
#[must_use]
pub fn format_value(field: &UiField, value: Option<&FieldValue>) -> String {
    let fallback = || {
        field
            .placeholder
            .clone()
            .unwrap_or_else(|| NOT_SPECIFIED.to_string())
    };

    let Some(value) = value.filter(|value| !value.is_null()) else {
        return fallback();
    };

    match field.kind {
        FieldType::Date => {
            let raw = raw_text(value);
            if raw.is_empty() {
                fallback()
            } else {
                format_date(&raw)
            }
        }
        FieldType::Currency => {
            let amount = match value {
                FieldValue::Number(n) => *n,
                FieldValue::Text(s) => s.parse().unwrap_or(0.0),
                FieldValue::Bool(b) => {
                    if *b {
                        1.0
                    } else {
                        0.0
                    }
                }
                FieldValue::Null => 0.0,
            };
            let code = field
                .format
                .as_ref()
                .and_then(|format| format.currency.as_deref());
            format_currency(amount, code)
        }
        FieldType::Boolean => {
            if value.truthy() {
                "Yes".to_string()
            } else {
                "No".to_string()
            }
        }
        FieldType::Phone => format_phone(&raw_text(value)),
        _ => {
            let raw = raw_text(value);
            let prefix = field
                .format
                .as_ref()
                .and_then(|format| format.prefix.as_deref())
                .unwrap_or("");
            let suffix = field
                .format
                .as_ref()
                .and_then(|format| format.suffix.as_deref())
                .unwrap_or("");
            format!("{prefix}{raw}{suffix}")
        }
    }
}

fn raw_text(value: &FieldValue) -> String {
    match value {
        FieldValue::Null => String::new(),
        FieldValue::Bool(b) => b.to_string(),
        FieldValue::Number(n) => format_number(*n),
        FieldValue::Text(s) => s.clone(),
    }
}

/// Render a number the way a data bag value reads: integers without a
/// fraction, everything else in plain decimal notation.
#[must_use]
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 9e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Format a date string as `MM/DD/YYYY`, passing unparseable input through.
#[must_use]
pub fn format_date(raw: &str) -> String {
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return date.format("%m/%d/%Y").to_string();
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return date.format("%m/%d/%Y").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%m/%d/%Y").to_string();
    }
    raw.to_string()
}

/// Format an amount as currency, grouping thousands.
///
/// USD (the default) renders with a `$` symbol; other codes are prefixed.
#[must_use]
pub fn format_currency(amount: f64, code: Option<&str>) -> String {
    let code = code.unwrap_or("USD");
    let negative = amount < 0.0;
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let grouped = group_thousands(int_part);

    let body = if code == "USD" {
        format!("${grouped}.{frac_part}")
    } else {
        format!("{code} {grouped}.{frac_part}")
    };

    if negative {
        format!("-{body}")
    } else {
        body
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    let offset = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - offset) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Format a 10-digit phone number as `(XXX) XXX-XXXX`; anything else passes
/// through unchanged.
#[must_use]
pub fn format_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 10 {
        format!("({}) {}-{}", &digits[0..3], &digits[3..6], &digits[6..10])
    } else {
        raw.to_string()
    }
}
