//! CKAN open-data portal client.
//!
//! Wraps the portal's action API over plain HTTP GET:
//! - `package_search` (keyword and tag-filtered dataset search)
//! - `package_show` (dataset details)
//! - `organization_list` / `organization_show`
//! - `tag_list`
//!
//! Raw payloads are normalized into the capped record types in [`types`]
//! before they leave this module.

pub mod config;
pub mod error;
pub mod types;

pub use config::CkanConfig;
pub use error::CkanError;
pub use types::{
    DatasetDetails, DatasetSummary, OrganizationDetails, OrganizationSummary, ResourceSummary,
    SearchPage,
};

use serde::Deserialize;

use crate::ckan::config::MAX_ROWS;
use crate::ckan::error::CkanResult;
use crate::ckan::types::{
    truncate_notes, DETAIL_NOTES_CAP, MAX_RESOURCES, MAX_TAGS, SEARCH_NOTES_CAP,
};

/// Maximum response-body excerpt carried in an API error.
const BODY_EXCERPT_CAP: usize = 200;

/// Placeholder used when a search hit has no description.
const NO_SEARCH_DESCRIPTION: &str = "No description available.";

/// Placeholder used when a detail record has no description.
const NO_DETAIL_DESCRIPTION: &str = "No description provided.";

/// CKAN portal client.
pub struct Client {
    config: CkanConfig,
    http: reqwest::Client,
}

impl Client {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn new(config: CkanConfig) -> CkanResult<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| CkanError::HttpClient(e.to_string()))?;

        Ok(Self { config, http })
    }

    /// Create a new client with default configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults() -> CkanResult<Self> {
        Self::new(CkanConfig::default())
    }

    /// Search datasets by keyword.
    ///
    /// `rows` is clamped to `1..=100`; `start` is the pagination offset.
    ///
    /// # Errors
    /// Returns an error on HTTP failure, a non-success status, an
    /// unsuccessful API envelope, or an unparseable body.
    pub async fn package_search(
        &self,
        query: &str,
        rows: Option<u32>,
        start: Option<u32>,
    ) -> CkanResult<SearchPage> {
        let rows = rows.unwrap_or(self.config.default_rows).clamp(1, MAX_ROWS);
        let start = start.unwrap_or(0);
        let query_string = format!(
            "q={}&rows={rows}&start={start}",
            urlencoding::encode(query)
        );

        let raw: RawSearchResult = self.fetch("package_search", &query_string).await?;
        Ok(normalize_search_page(raw))
    }

    /// Search datasets carrying a specific tag.
    ///
    /// # Errors
    /// Same failure modes as [`Client::package_search`].
    pub async fn package_search_by_tag(
        &self,
        tag: &str,
        rows: Option<u32>,
        start: Option<u32>,
    ) -> CkanResult<SearchPage> {
        let rows = rows.unwrap_or(self.config.default_rows).clamp(1, MAX_ROWS);
        let start = start.unwrap_or(0);
        let filter = format!("tags:\"{tag}\"");
        let query_string = format!(
            "q=&fq={}&rows={rows}&start={start}",
            urlencoding::encode(&filter)
        );

        let raw: RawSearchResult = self.fetch("package_search", &query_string).await?;
        Ok(normalize_search_page(raw))
    }

    /// Fetch the essential details of one dataset by name or id.
    ///
    /// # Errors
    /// Same failure modes as [`Client::package_search`].
    pub async fn package_show(&self, id: &str) -> CkanResult<DatasetDetails> {
        let query_string = format!("id={}", urlencoding::encode(id));
        let raw: RawDataset = self.fetch("package_show", &query_string).await?;
        Ok(normalize_details(raw, &self.config.base_url))
    }

    /// List organizations publishing on the portal, optionally filtered.
    ///
    /// # Errors
    /// Same failure modes as [`Client::package_search`].
    pub async fn organization_list(
        &self,
        query: Option<&str>,
    ) -> CkanResult<Vec<OrganizationSummary>> {
        let mut query_string = String::from("all_fields=true");
        if let Some(q) = query {
            query_string.push_str(&format!("&q={}", urlencoding::encode(q)));
        }

        let raw: Vec<RawOrganization> = self.fetch("organization_list", &query_string).await?;
        Ok(raw.into_iter().map(normalize_organization).collect())
    }

    /// Fetch the essential details of one organization by name or id.
    ///
    /// # Errors
    /// Same failure modes as [`Client::package_search`].
    pub async fn organization_show(&self, id: &str) -> CkanResult<OrganizationDetails> {
        let query_string = format!("id={}", urlencoding::encode(id));
        let raw: RawOrganization = self.fetch("organization_show", &query_string).await?;
        Ok(normalize_organization_details(raw))
    }

    /// List tag names, optionally filtered by a search string.
    ///
    /// # Errors
    /// Same failure modes as [`Client::package_search`].
    pub async fn tag_list(&self, query: Option<&str>) -> CkanResult<Vec<String>> {
        let query_string = query.map_or_else(String::new, |q| {
            format!("query={}", urlencoding::encode(q))
        });
        self.fetch("tag_list", &query_string).await
    }

    /// Perform one action-API GET and unwrap the CKAN envelope.
    async fn fetch<T>(&self, action: &str, query_string: &str) -> CkanResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = if query_string.is_empty() {
            format!("{}/api/3/action/{action}", self.config.base_url)
        } else {
            format!("{}/api/3/action/{action}?{query_string}", self.config.base_url)
        };
        tracing::debug!(%url, "requesting CKAN action");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(action, status = status.as_u16(), "CKAN API error response");
            return Err(CkanError::Api {
                status: status.as_u16(),
                body: body_excerpt(&body),
            });
        }

        let envelope: ApiEnvelope<T> = serde_json::from_str(&body)?;
        if !envelope.success {
            return Err(CkanError::Unsuccessful {
                action: action.to_string(),
            });
        }
        envelope.result.ok_or(CkanError::Unsuccessful {
            action: action.to_string(),
        })
    }
}

/// Standard CKAN action-API response envelope.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    #[serde(default)]
    success: bool,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct RawSearchResult {
    #[serde(default)]
    count: u64,
    #[serde(default)]
    results: Vec<RawDataset>,
}

#[derive(Debug, Deserialize)]
struct RawDataset {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    name: String,
    notes: Option<String>,
    organization: Option<RawOrganizationRef>,
    #[serde(default)]
    num_resources: u64,
    #[serde(default)]
    num_tags: u64,
    #[serde(default)]
    tags: Vec<RawTag>,
    #[serde(default)]
    resources: Vec<RawResource>,
    license_title: Option<String>,
    metadata_created: Option<String>,
    metadata_modified: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawOrganizationRef {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTag {
    display_name: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawResource {
    name: Option<String>,
    format: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawOrganization {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    title: Option<String>,
    description: Option<String>,
    package_count: Option<u64>,
    created: Option<String>,
}

fn normalize_search_page(raw: RawSearchResult) -> SearchPage {
    SearchPage {
        count: raw.count,
        results: raw.results.into_iter().map(normalize_summary).collect(),
    }
}

fn normalize_summary(raw: RawDataset) -> DatasetSummary {
    let notes = match raw.notes.as_deref() {
        Some(notes) if !notes.is_empty() => truncate_notes(notes, SEARCH_NOTES_CAP),
        _ => NO_SEARCH_DESCRIPTION.to_string(),
    };
    DatasetSummary {
        id: raw.id,
        title: raw.title,
        notes,
        organization_title: raw.organization.and_then(|o| o.title),
    }
}

fn normalize_details(raw: RawDataset, base_url: &str) -> DatasetDetails {
    let notes = match raw.notes.as_deref() {
        Some(notes) if !notes.is_empty() => truncate_notes(notes, DETAIL_NOTES_CAP),
        _ => NO_DETAIL_DESCRIPTION.to_string(),
    };
    let tags = raw
        .tags
        .into_iter()
        .filter_map(|tag| tag.display_name.or(tag.name))
        .take(MAX_TAGS)
        .collect();
    let resources_summary = raw
        .resources
        .into_iter()
        .take(MAX_RESOURCES)
        .map(|r| ResourceSummary {
            name: r.name,
            format: r.format,
            url: r.url,
        })
        .collect();
    let url = format!("{base_url}/dataset/{}", raw.name);

    DatasetDetails {
        id: raw.id,
        title: raw.title,
        name: raw.name,
        notes,
        organization_title: raw.organization.and_then(|o| o.title),
        num_resources: raw.num_resources,
        num_tags: raw.num_tags,
        tags,
        resources_summary,
        license_title: raw.license_title,
        metadata_created: raw.metadata_created,
        metadata_modified: raw.metadata_modified,
        url,
    }
}

fn normalize_organization(raw: RawOrganization) -> OrganizationSummary {
    let title = raw.title.unwrap_or_else(|| raw.name.clone());
    OrganizationSummary {
        id: raw.id,
        name: raw.name,
        title,
        package_count: raw.package_count,
    }
}

fn normalize_organization_details(raw: RawOrganization) -> OrganizationDetails {
    let title = raw.title.unwrap_or_else(|| raw.name.clone());
    let description = match raw.description.as_deref() {
        Some(text) if !text.is_empty() => truncate_notes(text, DETAIL_NOTES_CAP),
        _ => NO_DETAIL_DESCRIPTION.to_string(),
    };
    OrganizationDetails {
        id: raw.id,
        name: raw.name,
        title,
        description,
        package_count: raw.package_count,
        created: raw.created,
    }
}

fn body_excerpt(body: &str) -> String {
    if body.chars().count() <= BODY_EXCERPT_CAP {
        body.to_string()
    } else {
        body.chars().take(BODY_EXCERPT_CAP).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_dataset(notes_len: usize, tags: usize, resources: usize) -> RawDataset {
        RawDataset {
            id: "abc-123".to_string(),
            title: "Water Quality Monitoring".to_string(),
            name: "water-quality-monitoring".to_string(),
            notes: Some("n".repeat(notes_len)),
            organization: Some(RawOrganizationRef {
                title: Some("Environment Agency".to_string()),
            }),
            num_resources: resources as u64,
            num_tags: tags as u64,
            tags: (0..tags)
                .map(|i| RawTag {
                    display_name: Some(format!("tag-{i}")),
                    name: None,
                })
                .collect(),
            resources: (0..resources)
                .map(|i| RawResource {
                    name: Some(format!("resource-{i}")),
                    format: Some("CSV".to_string()),
                    url: Some(format!("https://example.org/r/{i}")),
                })
                .collect(),
            license_title: Some("Open License".to_string()),
            metadata_created: Some("2023-04-01T10:00:00".to_string()),
            metadata_modified: Some("2024-01-15T08:30:00".to_string()),
        }
    }

    #[test]
    fn test_summary_notes_capped() {
        let summary = normalize_summary(raw_dataset(400, 0, 0));
        assert_eq!(summary.notes.chars().count(), SEARCH_NOTES_CAP + 1);
        assert!(summary.notes.ends_with('…'));
        assert_eq!(
            summary.organization_title.as_deref(),
            Some("Environment Agency")
        );
    }

    #[test]
    fn test_summary_missing_notes_get_placeholder() {
        let mut raw = raw_dataset(0, 0, 0);
        raw.notes = None;
        let summary = normalize_summary(raw);
        assert_eq!(summary.notes, NO_SEARCH_DESCRIPTION);
    }

    #[test]
    fn test_details_caps_tags_and_resources() {
        let details = normalize_details(raw_dataset(600, 9, 7), "https://portal.example");
        assert_eq!(details.tags.len(), MAX_TAGS);
        assert_eq!(details.resources_summary.len(), MAX_RESOURCES);
        assert_eq!(details.num_tags, 9);
        assert_eq!(details.num_resources, 7);
        assert_eq!(details.notes.chars().count(), DETAIL_NOTES_CAP + 1);
        assert_eq!(
            details.url,
            "https://portal.example/dataset/water-quality-monitoring"
        );
    }

    #[test]
    fn test_details_normalization_is_deterministic() {
        let a = normalize_details(raw_dataset(600, 4, 2), "https://portal.example");
        let b = normalize_details(raw_dataset(600, 4, 2), "https://portal.example");
        assert_eq!(
            serde_json::to_string(&a).ok(),
            serde_json::to_string(&b).ok()
        );
    }

    #[test]
    fn test_envelope_success_false_detected() {
        let body = r#"{"success": false, "error": {"message": "Not found"}}"#;
        let envelope: Result<ApiEnvelope<RawSearchResult>, _> = serde_json::from_str(body);
        assert!(matches!(
            envelope,
            Ok(ApiEnvelope {
                success: false,
                result: None,
            })
        ));
    }

    #[test]
    fn test_body_excerpt_capped() {
        let body = "x".repeat(1000);
        assert_eq!(body_excerpt(&body).chars().count(), BODY_EXCERPT_CAP);
    }
}
