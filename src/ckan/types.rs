//! Normalized record types produced from CKAN payloads.

use serde::{Deserialize, Serialize};

/// Character cap applied to dataset notes in search summaries.
pub const SEARCH_NOTES_CAP: usize = 150;

/// Character cap applied to dataset notes in detail records.
pub const DETAIL_NOTES_CAP: usize = 500;

/// Maximum number of tags carried on a detail record.
pub const MAX_TAGS: usize = 5;

/// Maximum number of resources summarized on a detail record.
pub const MAX_RESOURCES: usize = 3;

/// One page of dataset search results.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchPage {
    /// Total number of datasets matching the query, across all pages.
    pub count: u64,
    /// The datasets on this page.
    pub results: Vec<DatasetSummary>,
}

/// A concise dataset entry as returned by a search.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatasetSummary {
    /// Dataset identifier.
    pub id: String,
    /// Dataset title.
    pub title: String,
    /// Capped description.
    pub notes: String,
    /// Publishing organization title, when known.
    pub organization_title: Option<String>,
}

/// A summarized resource attached to a dataset.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceSummary {
    /// Resource name.
    pub name: Option<String>,
    /// File format (CSV, JSON, ...).
    pub format: Option<String>,
    /// Download or landing URL.
    pub url: Option<String>,
}

/// The essential fields of a single dataset.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatasetDetails {
    /// Dataset identifier.
    pub id: String,
    /// Dataset title.
    pub title: String,
    /// URL-safe dataset name.
    pub name: String,
    /// Capped description.
    pub notes: String,
    /// Publishing organization title, when known.
    pub organization_title: Option<String>,
    /// Number of resources attached to the dataset.
    pub num_resources: u64,
    /// Number of tags attached to the dataset.
    pub num_tags: u64,
    /// Up to [`MAX_TAGS`] tag names.
    pub tags: Vec<String>,
    /// Up to [`MAX_RESOURCES`] summarized resources.
    pub resources_summary: Vec<ResourceSummary>,
    /// License title, when declared.
    pub license_title: Option<String>,
    /// Creation timestamp as reported by the portal.
    pub metadata_created: Option<String>,
    /// Last-modified timestamp as reported by the portal.
    pub metadata_modified: Option<String>,
    /// Portal page for the dataset.
    pub url: String,
}

/// A concise organization entry as returned by a listing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrganizationSummary {
    /// Organization identifier.
    pub id: String,
    /// URL-safe organization name.
    pub name: String,
    /// Display title.
    pub title: String,
    /// Number of datasets the organization publishes, when known.
    pub package_count: Option<u64>,
}

/// The essential fields of a single organization.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrganizationDetails {
    /// Organization identifier.
    pub id: String,
    /// URL-safe organization name.
    pub name: String,
    /// Display title.
    pub title: String,
    /// Capped description.
    pub description: String,
    /// Number of datasets the organization publishes, when known.
    pub package_count: Option<u64>,
    /// Creation timestamp as reported by the portal.
    pub created: Option<String>,
}

/// Truncate text to `cap` characters, appending an ellipsis marker when cut.
///
/// The returned string never exceeds `cap + 1` characters including the
/// marker. Empty input is passed through unchanged.
#[must_use]
pub fn truncate_notes(text: &str, cap: usize) -> String {
    if text.chars().count() <= cap {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(cap).collect();
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_notes_untouched() {
        assert_eq!(truncate_notes("water quality", 150), "water quality");
    }

    #[test]
    fn test_exact_cap_untouched() {
        let text = "a".repeat(150);
        assert_eq!(truncate_notes(&text, 150), text);
    }

    #[test]
    fn test_long_notes_capped_with_marker() {
        let text = "b".repeat(400);
        let truncated = truncate_notes(&text, SEARCH_NOTES_CAP);
        assert_eq!(truncated.chars().count(), SEARCH_NOTES_CAP + 1);
        assert!(truncated.ends_with('…'));
    }

    #[test]
    fn test_detail_cap() {
        let text = "c".repeat(1000);
        let truncated = truncate_notes(&text, DETAIL_NOTES_CAP);
        assert_eq!(truncated.chars().count(), DETAIL_NOTES_CAP + 1);
    }

    #[test]
    fn test_multibyte_truncation_counts_chars() {
        let text = "é".repeat(200);
        let truncated = truncate_notes(&text, 150);
        assert_eq!(truncated.chars().count(), 151);
    }
}
