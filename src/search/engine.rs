use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::models::{BinModel, ItemModel};

use super::{index_configs, organization_filter, BINS_INDEX, ITEMS_INDEX};

/// Thin client for a Meilisearch-compatible search engine.
pub struct SearchEngine {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    hits: Vec<serde_json::Value>,
}

impl SearchEngine {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }

    async fn check(response: reqwest::Response, context: &str) -> AppResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Search(format!(
            "{}: status={}, body={}",
            context, status, body
        )))
    }

    /// Creates the indexes and pushes their settings. Safe to repeat; an
    /// already-existing index is not an error.
    pub async fn ensure_indexes(&self) -> AppResult<()> {
        for config in index_configs() {
            let response = self
                .request(reqwest::Method::POST, "/indexes")
                .json(&json!({ "uid": config.uid, "primaryKey": config.primary_key }))
                .send()
                .await
                .map_err(|e| AppError::Search(format!("Index create request failed: {}", e)))?;
            // 409/index_already_exists is fine
            if !response.status().is_success() && response.status().as_u16() != 409 {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::Search(format!(
                    "Index create failed: status={}, body={}",
                    status, body
                )));
            }

            let response = self
                .request(
                    reqwest::Method::PATCH,
                    &format!("/indexes/{}/settings", config.uid),
                )
                .json(&config)
                .send()
                .await
                .map_err(|e| AppError::Search(format!("Settings request failed: {}", e)))?;
            Self::check(response, "Settings push failed").await?;

            tracing::info!("Search index configured: {}", config.uid);
        }
        Ok(())
    }

    async fn add_documents(&self, index: &str, documents: &[serde_json::Value]) -> AppResult<()> {
        if documents.is_empty() {
            return Ok(());
        }
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/indexes/{}/documents", index),
            )
            .json(documents)
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Document push request failed: {}", e)))?;
        Self::check(response, "Document push failed").await?;
        Ok(())
    }

    async fn delete_document(&self, index: &str, id: &str) -> AppResult<()> {
        let response = self
            .request(
                reqwest::Method::DELETE,
                &format!("/indexes/{}/documents/{}", index, id),
            )
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Document delete request failed: {}", e)))?;
        Self::check(response, "Document delete failed").await?;
        Ok(())
    }

    pub async fn index_bin(&self, bin: &BinModel) -> AppResult<()> {
        self.add_documents(BINS_INDEX, &[bin_document(bin)]).await
    }

    pub async fn index_bins(&self, bins: &[BinModel]) -> AppResult<()> {
        let docs: Vec<_> = bins.iter().map(bin_document).collect();
        self.add_documents(BINS_INDEX, &docs).await
    }

    pub async fn remove_bin(&self, bin_id: &str) -> AppResult<()> {
        self.delete_document(BINS_INDEX, bin_id).await
    }

    pub async fn index_item(&self, item: &ItemModel) -> AppResult<()> {
        self.add_documents(ITEMS_INDEX, &[item_document(item)]).await
    }

    pub async fn index_items(&self, items: &[ItemModel]) -> AppResult<()> {
        let docs: Vec<_> = items.iter().map(item_document).collect();
        self.add_documents(ITEMS_INDEX, &docs).await
    }

    pub async fn remove_item(&self, item_id: &str) -> AppResult<()> {
        self.delete_document(ITEMS_INDEX, item_id).await
    }

    /// Runs a query against one index, scoped to an organization.
    pub async fn search(
        &self,
        index: &str,
        organization_id: &str,
        query: &str,
        limit: i32,
    ) -> AppResult<Vec<serde_json::Value>> {
        let response = self
            .request(reqwest::Method::POST, &format!("/indexes/{}/search", index))
            .json(&json!({
                "q": query,
                "filter": organization_filter(organization_id),
                "limit": limit,
            }))
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Search request failed: {}", e)))?;
        let response = Self::check(response, "Search failed").await?;

        let results: SearchResults = response
            .json()
            .await
            .map_err(|e| AppError::Search(format!("Failed to parse search response: {}", e)))?;
        Ok(results.hits)
    }
}

fn bin_document(bin: &BinModel) -> serde_json::Value {
    json!({
        "id": bin.id,
        "organization_id": bin.organization_id,
        "label": bin.label,
        "location": bin.location,
        "description": bin.description,
        "updated_at": bin.updated_at.timestamp(),
    })
}

fn item_document(item: &ItemModel) -> serde_json::Value {
    json!({
        "id": item.id,
        "organization_id": item.organization_id,
        "name": item.name,
        "description": item.description,
        "unit": item.unit,
        "category_id": item.category_id,
        "updated_at": item.updated_at.timestamp(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_bin_document_fields() {
        let bin = BinModel {
            id: "b1".into(),
            organization_id: "o1".into(),
            user_id: "u1".into(),
            label: "Garage shelf A".into(),
            location: "garage".into(),
            description: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let doc = bin_document(&bin);
        assert_eq!(doc["id"], "b1");
        assert_eq!(doc["organization_id"], "o1");
        assert_eq!(doc["label"], "Garage shelf A");
        // user_id is not indexed
        assert!(doc.get("user_id").is_none());
    }
}
