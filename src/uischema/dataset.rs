//! Mapping of normalized dataset records into UI schemas.

use std::collections::BTreeMap;

use crate::ckan::DatasetDetails;
use crate::uischema::types::{
    ActionKind, FieldType, FieldValue, MetadataKind, SchemaKind, SectionLayout, UiAction, UiField,
    UiHeader, UiMetadata, UiSchema, UiSection, UiTab,
};

/// Build a detail-view schema for one dataset.
///
/// Every field key the schema references resolves in its own data bag, so
/// the renderer never needs a fallback for a mapped record.
#[must_use]
pub fn dataset_detail_schema(details: &DatasetDetails) -> UiSchema {
    let mut data: BTreeMap<String, FieldValue> = BTreeMap::new();
    data.insert("title".to_string(), FieldValue::from(details.title.clone()));
    data.insert("name".to_string(), FieldValue::from(details.name.clone()));
    data.insert("notes".to_string(), FieldValue::from(details.notes.clone()));
    data.insert(
        "organizationTitle".to_string(),
        FieldValue::from(details.organization_title.clone()),
    );
    data.insert(
        "numResources".to_string(),
        FieldValue::from(details.num_resources),
    );
    data.insert("numTags".to_string(), FieldValue::from(details.num_tags));
    data.insert(
        "tags".to_string(),
        if details.tags.is_empty() {
            FieldValue::Null
        } else {
            FieldValue::from(details.tags.join(", "))
        },
    );
    data.insert(
        "licenseTitle".to_string(),
        FieldValue::from(details.license_title.clone()),
    );
    data.insert(
        "metadataCreated".to_string(),
        FieldValue::from(details.metadata_created.clone()),
    );
    data.insert(
        "metadataModified".to_string(),
        FieldValue::from(details.metadata_modified.clone()),
    );
    data.insert("url".to_string(), FieldValue::from(details.url.clone()));

    let mut resource_fields = Vec::new();
    for (index, resource) in details.resources_summary.iter().enumerate() {
        let name_key = format!("resource{index}Name");
        let format_key = format!("resource{index}Format");
        let url_key = format!("resource{index}Url");

        data.insert(name_key.clone(), FieldValue::from(resource.name.clone()));
        data.insert(
            format_key.clone(),
            FieldValue::from(resource.format.clone()),
        );
        data.insert(url_key.clone(), FieldValue::from(resource.url.clone()));

        resource_fields.push(UiField::new(
            name_key,
            format!("Resource {}", index + 1),
            FieldType::Text,
        ));
        resource_fields.push(UiField::new(format_key, "Format", FieldType::Badge));
        resource_fields.push(UiField::new(url_key, "Download", FieldType::Url));
    }

    let header = UiHeader {
        title: details.title.clone(),
        subtitle: details.organization_title.clone(),
        status: None,
        metadata: vec![
            UiMetadata {
                label: "Organization".to_string(),
                value: details
                    .organization_title
                    .clone()
                    .unwrap_or_else(|| "Unknown publisher".to_string()),
                kind: Some(MetadataKind::Text),
                icon: None,
            },
            UiMetadata {
                label: "Created".to_string(),
                value: details.metadata_created.clone().unwrap_or_default(),
                kind: Some(MetadataKind::Date),
                icon: None,
            },
            UiMetadata {
                label: "Modified".to_string(),
                value: details.metadata_modified.clone().unwrap_or_default(),
                kind: Some(MetadataKind::Date),
                icon: None,
            },
            UiMetadata {
                label: "Portal page".to_string(),
                value: details.url.clone(),
                kind: Some(MetadataKind::Link),
                icon: None,
            },
        ],
        actions: None,
    };

    let details_tab = UiTab {
        id: "details".to_string(),
        label: "Details".to_string(),
        count: None,
        sections: vec![
            UiSection {
                title: "Dataset Information".to_string(),
                description: None,
                fields: vec![
                    UiField::new("name", "Dataset Name", FieldType::Text),
                    UiField::new("organizationTitle", "Organization", FieldType::Text),
                    UiField::new("licenseTitle", "License", FieldType::Text),
                    UiField::new("metadataCreated", "Created", FieldType::Date),
                    UiField::new("metadataModified", "Last Modified", FieldType::Date),
                    UiField::new("url", "Portal Page", FieldType::Url),
                ],
                layout: SectionLayout::Grid,
                columns: Some(3),
                collapsible: false,
                default_expanded: None,
                actions: None,
            },
            UiSection {
                title: "Description".to_string(),
                description: None,
                fields: vec![
                    UiField::new("notes", "Description", FieldType::Textarea),
                    UiField::new("tags", "Tags", FieldType::Badge),
                ],
                layout: SectionLayout::List,
                columns: None,
                collapsible: true,
                default_expanded: Some(true),
                actions: None,
            },
        ],
        actions: None,
    };

    let resources_tab = UiTab {
        id: "resources".to_string(),
        label: "Resources".to_string(),
        count: Some(details.num_resources),
        sections: vec![UiSection {
            title: "Available Resources".to_string(),
            description: if details.resources_summary.is_empty() {
                Some("This dataset lists no downloadable resources.".to_string())
            } else {
                None
            },
            fields: resource_fields,
            layout: SectionLayout::Grid,
            columns: Some(3),
            collapsible: false,
            default_expanded: None,
            actions: None,
        }],
        actions: None,
    };

    UiSchema {
        kind: SchemaKind::Detail,
        header: Some(header),
        tabs: Some(vec![details_tab, resources_tab]),
        sections: None,
        actions: Some(vec![UiAction::new(
            "open_portal_page",
            "Open portal page",
            ActionKind::Link,
        )]),
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ckan::ResourceSummary;

    fn details() -> DatasetDetails {
        DatasetDetails {
            id: "abc".to_string(),
            title: "Air Quality".to_string(),
            name: "air-quality".to_string(),
            notes: "Hourly readings.".to_string(),
            organization_title: Some("Environment Agency".to_string()),
            num_resources: 2,
            num_tags: 1,
            tags: vec!["air".to_string()],
            resources_summary: vec![
                ResourceSummary {
                    name: Some("2024".to_string()),
                    format: Some("CSV".to_string()),
                    url: Some("https://example.org/2024.csv".to_string()),
                },
                ResourceSummary {
                    name: None,
                    format: None,
                    url: None,
                },
            ],
            license_title: None,
            metadata_created: Some("2023-04-01T10:00:00".to_string()),
            metadata_modified: None,
            url: "https://portal.example/dataset/air-quality".to_string(),
        }
    }

    #[test]
    fn test_every_field_key_resolves_in_data() {
        let schema = dataset_detail_schema(&details());
        for tab in schema.tabs.as_deref().unwrap_or(&[]) {
            for section in &tab.sections {
                for field in &section.fields {
                    assert!(
                        schema.data.contains_key(&field.key),
                        "unresolved key: {}",
                        field.key
                    );
                }
            }
        }
    }

    #[test]
    fn test_header_and_tabs_shape() {
        let schema = dataset_detail_schema(&details());
        assert!(matches!(
            schema.header,
            Some(ref header) if header.title == "Air Quality"
        ));
        let tabs = schema.tabs.as_deref().unwrap_or(&[]);
        assert_eq!(tabs.len(), 2);
        assert_eq!(tabs[0].id, "details");
        assert_eq!(tabs[1].count, Some(2));
    }

    #[test]
    fn test_resource_fields_generated_per_resource() {
        let schema = dataset_detail_schema(&details());
        assert!(schema.data.contains_key("resource0Url"));
        assert!(schema.data.contains_key("resource1Name"));
        assert_eq!(
            schema.data.get("resource1Name"),
            Some(&FieldValue::Null)
        );
    }
}
