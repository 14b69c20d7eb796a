//! Full-text search wrapper.
//!
//! Index configuration is declarative: each entity gets an index with
//! searchable/filterable/sortable attributes pushed to the engine at
//! startup. Query-time failures fall back to a database LIKE query in
//! the search service, never to an error for the caller.

pub mod engine;

pub use engine::SearchEngine;

use serde::Serialize;

pub const BINS_INDEX: &str = "bins";
pub const ITEMS_INDEX: &str = "items";

/// Declarative per-index configuration pushed to the engine.
#[derive(Debug, Clone, Serialize)]
pub struct IndexConfig {
    #[serde(skip)]
    pub uid: &'static str,
    #[serde(skip)]
    pub primary_key: &'static str,
    #[serde(rename = "searchableAttributes")]
    pub searchable: &'static [&'static str],
    #[serde(rename = "filterableAttributes")]
    pub filterable: &'static [&'static str],
    #[serde(rename = "sortableAttributes")]
    pub sortable: &'static [&'static str],
    #[serde(rename = "rankingRules")]
    pub ranking_rules: &'static [&'static str],
}

const DEFAULT_RANKING: &[&str] = &["words", "typo", "proximity", "attribute", "exactness"];

pub fn index_configs() -> Vec<IndexConfig> {
    vec![
        IndexConfig {
            uid: BINS_INDEX,
            primary_key: "id",
            searchable: &["label", "location", "description"],
            filterable: &["organization_id"],
            sortable: &["updated_at"],
            ranking_rules: DEFAULT_RANKING,
        },
        IndexConfig {
            uid: ITEMS_INDEX,
            primary_key: "id",
            searchable: &["name", "description", "unit"],
            filterable: &["organization_id", "category_id"],
            sortable: &["updated_at"],
            ranking_rules: DEFAULT_RANKING,
        },
    ]
}

/// Filter expression scoping a query to one organization.
pub fn organization_filter(organization_id: &str) -> String {
    format!("organization_id = \"{}\"", organization_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_configs() {
        let configs = index_configs();
        assert_eq!(configs.len(), 2);
        let bins = configs.iter().find(|c| c.uid == BINS_INDEX).unwrap();
        assert!(bins.searchable.contains(&"label"));
        assert!(bins.filterable.contains(&"organization_id"));
        let items = configs.iter().find(|c| c.uid == ITEMS_INDEX).unwrap();
        assert!(items.filterable.contains(&"category_id"));
    }

    #[test]
    fn test_settings_serialization_uses_engine_names() {
        let json = serde_json::to_value(&index_configs()[0]).unwrap();
        assert!(json.get("searchableAttributes").is_some());
        assert!(json.get("rankingRules").is_some());
        // uid/primary_key are index creation parameters, not settings
        assert!(json.get("uid").is_none());
    }

    #[test]
    fn test_organization_filter() {
        assert_eq!(
            organization_filter("abc-123"),
            "organization_id = \"abc-123\""
        );
    }
}
