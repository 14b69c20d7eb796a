use std::sync::Arc;

use sqlx::PgPool;
use tonic::{Request, Response, Status};

use crate::middleware::AuthenticatedUser;
use crate::models::organization::is_admin;
use crate::models::{BinModel, ItemModel};
use crate::proto::common::Empty;
use crate::proto::search::search_service_server::SearchService;
use crate::proto::search::{ReindexResponse, SearchHit, SearchRequest, SearchResponse};
use crate::search::{SearchEngine, BINS_INDEX, ITEMS_INDEX};

const DEFAULT_LIMIT: i32 = 20;
const MAX_LIMIT: i32 = 50;

pub struct SearchServiceImpl {
    pool: PgPool,
    engine: Option<Arc<SearchEngine>>,
}

impl SearchServiceImpl {
    pub fn new(pool: PgPool, engine: Option<Arc<SearchEngine>>) -> Self {
        Self { pool, engine }
    }

    fn get_authenticated_user<T>(request: &Request<T>) -> Result<AuthenticatedUser, Status> {
        request
            .extensions()
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| Status::unauthenticated("Authentication required"))
    }

    fn hit_from_document(entity: &str, doc: &serde_json::Value) -> SearchHit {
        let field = |name: &str| {
            doc.get(name)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        match entity {
            "bins" => SearchHit {
                entity: "bin".to_string(),
                id: field("id"),
                title: field("label"),
                subtitle: field("location"),
            },
            _ => SearchHit {
                entity: "item".to_string(),
                id: field("id"),
                title: field("name"),
                subtitle: field("unit"),
            },
        }
    }

    async fn engine_search(
        &self,
        engine: &SearchEngine,
        org_id: &str,
        query: &str,
        entity: &str,
        limit: i32,
    ) -> Result<Vec<SearchHit>, crate::error::AppError> {
        let mut hits = Vec::new();
        if entity.is_empty() || entity == "bins" {
            for doc in engine.search(BINS_INDEX, org_id, query, limit).await? {
                hits.push(Self::hit_from_document("bins", &doc));
            }
        }
        if entity.is_empty() || entity == "items" {
            for doc in engine.search(ITEMS_INDEX, org_id, query, limit).await? {
                hits.push(Self::hit_from_document("items", &doc));
            }
        }
        hits.truncate(limit as usize);
        Ok(hits)
    }

    /// ILIKE fallback for when the search engine is down or not configured.
    /// Substring match only, no typo tolerance.
    async fn db_search(
        &self,
        org_id: &str,
        query: &str,
        entity: &str,
        limit: i32,
    ) -> Result<Vec<SearchHit>, Status> {
        let pattern = format!("%{}%", query);
        let mut hits = Vec::new();

        if entity.is_empty() || entity == "bins" {
            let rows: Vec<(String, String, String)> = sqlx::query_as(
                "SELECT id::text, label, location FROM bins
                 WHERE organization_id = $1::uuid AND deleted_at IS NULL
                   AND (label ILIKE $2 OR location ILIKE $2 OR description ILIKE $2)
                 ORDER BY label
                 LIMIT $3",
            )
            .bind(org_id)
            .bind(&pattern)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

            hits.extend(rows.into_iter().map(|(id, label, location)| SearchHit {
                entity: "bin".to_string(),
                id,
                title: label,
                subtitle: location,
            }));
        }

        if entity.is_empty() || entity == "items" {
            let rows: Vec<(String, String, String)> = sqlx::query_as(
                "SELECT id::text, name, unit FROM items
                 WHERE organization_id = $1::uuid AND deleted_at IS NULL
                   AND (name ILIKE $2 OR description ILIKE $2)
                 ORDER BY name
                 LIMIT $3",
            )
            .bind(org_id)
            .bind(&pattern)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

            hits.extend(rows.into_iter().map(|(id, name, unit)| SearchHit {
                entity: "item".to_string(),
                id,
                title: name,
                subtitle: unit,
            }));
        }

        hits.truncate(limit as usize);
        Ok(hits)
    }
}

#[tonic::async_trait]
impl SearchService for SearchServiceImpl {
    async fn search(
        &self,
        request: Request<SearchRequest>,
    ) -> Result<Response<SearchResponse>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        if req.query.is_empty() {
            return Err(Status::invalid_argument("query is required"));
        }
        if !req.entity.is_empty() && req.entity != "bins" && req.entity != "items" {
            return Err(Status::invalid_argument(
                "entity must be \"bins\", \"items\" or empty",
            ));
        }
        let limit = if req.limit <= 0 {
            DEFAULT_LIMIT
        } else {
            req.limit.min(MAX_LIMIT)
        };

        if let Some(engine) = &self.engine {
            match self
                .engine_search(engine, &auth_user.org_id, &req.query, &req.entity, limit)
                .await
            {
                Ok(hits) => {
                    return Ok(Response::new(SearchResponse {
                        hits,
                        used_fallback: false,
                    }));
                }
                Err(e) => {
                    tracing::warn!("Search engine unavailable, using database fallback: {}", e);
                }
            }
        }

        let hits = self
            .db_search(&auth_user.org_id, &req.query, &req.entity, limit)
            .await?;
        Ok(Response::new(SearchResponse {
            hits,
            used_fallback: true,
        }))
    }

    async fn reindex(&self, request: Request<Empty>) -> Result<Response<ReindexResponse>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;

        if !is_admin(&auth_user.role) {
            return Err(Status::permission_denied("Admin role required"));
        }
        let engine = self
            .engine
            .as_ref()
            .ok_or_else(|| Status::unimplemented("Search engine is not configured"))?;

        engine.ensure_indexes().await.map_err(Status::from)?;

        let bins: Vec<BinModel> = sqlx::query_as(
            "SELECT id::text, organization_id::text, user_id::text, label, location, description,
                    created_at, updated_at
             FROM bins
             WHERE organization_id = $1::uuid AND deleted_at IS NULL",
        )
        .bind(&auth_user.org_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        let items: Vec<ItemModel> = sqlx::query_as(
            "SELECT id::text, organization_id::text, name, description, quantity, min_quantity,
                    unit, category_id::text, image_url, created_at, updated_at
             FROM items
             WHERE organization_id = $1::uuid AND deleted_at IS NULL",
        )
        .bind(&auth_user.org_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        engine.index_bins(&bins).await.map_err(Status::from)?;
        engine.index_items(&items).await.map_err(Status::from)?;

        tracing::info!(
            "Reindexed organization {}: {} bins, {} items",
            auth_user.org_id,
            bins.len(),
            items.len()
        );

        Ok(Response::new(ReindexResponse {
            bins_indexed: bins.len() as i32,
            items_indexed: items.len() as i32,
        }))
    }
}
