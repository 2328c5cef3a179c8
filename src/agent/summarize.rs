//! Conversational summaries of normalized tool results.
//!
//! Every function here is a pure, deterministic mapping from a normalized
//! record to the assistant text appended to the thread. Summaries are the
//! only part of a tool result the language model ever sees again, so they
//! stay short and stable.

use crate::ckan::{
    DatasetDetails, OrganizationDetails, OrganizationSummary, SearchPage,
};

/// Maximum number of tag names listed in a tag summary.
const MAX_LISTED_TAGS: usize = 20;

/// Summarize one page of dataset search results.
///
/// States the total count, lists each result on the page, notes when more
/// results exist beyond the page, and suggests a detail fetch when the
/// search matched exactly one dataset.
#[must_use]
pub fn search_datasets(page: &SearchPage) -> String {
    if page.count == 0 {
        return "No datasets were found for that search. Try different keywords.".to_string();
    }

    if page.count == 1 {
        if let Some(only) = page.results.first() {
            return format!(
                "I found exactly 1 dataset: \"{}\" (id: {}). Would you like me to fetch its details?",
                only.title, only.id
            );
        }
    }

    let mut summary = format!(
        "I found {} datasets in total. Here are the first {}:\n",
        page.count,
        page.results.len()
    );
    for dataset in &page.results {
        match &dataset.organization_title {
            Some(org) => summary.push_str(&format!("- {} (published by {org})\n", dataset.title)),
            None => summary.push_str(&format!("- {}\n", dataset.title)),
        }
    }

    if page.count > page.results.len() as u64 {
        summary.push_str("More datasets are available beyond this page; tell me if you want to see further results.");
    }

    summary.trim_end().to_string()
}

/// Summarize the details of one dataset.
#[must_use]
pub fn dataset_details(details: &DatasetDetails) -> String {
    let organization = details
        .organization_title
        .as_deref()
        .unwrap_or("an unknown organization");

    let mut summary = format!(
        "\"{}\" is published by {organization}. It has {} resource(s) and {} tag(s).\n",
        details.title, details.num_resources, details.num_tags
    );

    summary.push_str(&format!("Description: {}\n", details.notes));

    if !details.tags.is_empty() {
        summary.push_str(&format!("Tags: {}.\n", details.tags.join(", ")));
    }

    if !details.resources_summary.is_empty() {
        summary.push_str("Here are some of its resources:\n");
        for resource in &details.resources_summary {
            let name = resource.name.as_deref().unwrap_or("unnamed resource");
            let format = resource.format.as_deref().unwrap_or("unknown format");
            match &resource.url {
                Some(url) => summary.push_str(&format!("- {name} ({format}): {url}\n")),
                None => summary.push_str(&format!("- {name} ({format})\n")),
            }
        }
    }

    if let Some(license) = &details.license_title {
        summary.push_str(&format!("License: {license}.\n"));
    }

    summary.push_str(&format!("Portal page: {}", details.url));
    summary
}

/// Summarize a listing of organizations.
#[must_use]
pub fn organizations(list: &[OrganizationSummary]) -> String {
    if list.is_empty() {
        return "No organizations were found on the portal.".to_string();
    }

    let mut summary = format!("I found {} organization(s):\n", list.len());
    for organization in list {
        match organization.package_count {
            Some(count) => summary.push_str(&format!(
                "- {} ({count} dataset(s))\n",
                organization.title
            )),
            None => summary.push_str(&format!("- {}\n", organization.title)),
        }
    }
    summary.trim_end().to_string()
}

/// Summarize the details of one organization.
#[must_use]
pub fn organization_details(details: &OrganizationDetails) -> String {
    let mut summary = format!("\"{}\"", details.title);
    match details.package_count {
        Some(count) => summary.push_str(&format!(" publishes {count} dataset(s).\n")),
        None => summary.push_str(" is registered on the portal.\n"),
    }
    summary.push_str(&format!("Description: {}", details.description));
    summary
}

/// Summarize a listing of tags.
#[must_use]
pub fn tags(list: &[String]) -> String {
    if list.is_empty() {
        return "No tags were found on the portal.".to_string();
    }

    let listed: Vec<&str> = list
        .iter()
        .take(MAX_LISTED_TAGS)
        .map(String::as_str)
        .collect();
    let mut summary = format!("I found {} tag(s): {}.", list.len(), listed.join(", "));
    if list.len() > MAX_LISTED_TAGS {
        summary.push_str(&format!(
            " ({} more not shown.)",
            list.len() - MAX_LISTED_TAGS
        ));
    }
    summary
}
