use std::sync::Arc;

use sqlx::PgPool;
use tonic::{Request, Response, Status};

use crate::db::record_audit;
use crate::middleware::AuthenticatedUser;
use crate::models::{BinItemRow, BinModel};
use crate::proto::bins::bin_service_server::BinService;
use crate::proto::bins::{
    AddItemToBinRequest, Bin, BinContentsResponse, BinItemEntry, BinResponse, CreateBinRequest,
    DeleteBinRequest, GetBinRequest, GetBinResponse, ListBinsRequest, ListBinsResponse,
    RemoveItemFromBinRequest, UpdateBinItemRequest, UpdateBinRequest,
};
use crate::proto::common::Empty;
use crate::search::SearchEngine;
use crate::services::qr_service;

pub struct BinServiceImpl {
    pool: PgPool,
    search: Option<Arc<SearchEngine>>,
    qr_base_url: String,
}

pub(crate) fn bin_to_proto(model: &BinModel, short_code: String, item_count: i32) -> Bin {
    Bin {
        id: model.id.clone(),
        label: model.label.clone(),
        location: model.location.clone(),
        description: model.description.clone(),
        short_code,
        item_count,
        created_at: model.created_at.to_rfc3339(),
        updated_at: model.updated_at.to_rfc3339(),
    }
}

/// Fetches a live bin scoped to the caller's organization.
pub(crate) async fn fetch_bin(
    pool: &PgPool,
    org_id: &str,
    bin_id: &str,
) -> Result<BinModel, Status> {
    sqlx::query_as::<_, BinModel>(
        "SELECT id::text, organization_id::text, user_id::text, label, location, description,
                created_at, updated_at
         FROM bins
         WHERE id = $1::uuid AND organization_id = $2::uuid AND deleted_at IS NULL",
    )
    .bind(bin_id)
    .bind(org_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| Status::internal(format!("Database error: {}", e)))?
    .ok_or_else(|| Status::not_found("Bin not found"))
}

/// A bin's contents with the per-item low-stock flag.
pub(crate) async fn fetch_bin_contents(
    pool: &PgPool,
    bin_id: &str,
) -> Result<Vec<BinItemEntry>, Status> {
    let rows: Vec<BinItemRow> = sqlx::query_as(
        "SELECT bi.item_id::text, i.name, i.unit, bi.quantity, bi.notes,
                i.quantity AS item_quantity, i.min_quantity AS item_min_quantity
         FROM bin_items bi
         JOIN items i ON i.id = bi.item_id
         WHERE bi.bin_id = $1::uuid AND i.deleted_at IS NULL
         ORDER BY i.name",
    )
    .bind(bin_id)
    .fetch_all(pool)
    .await
    .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

    Ok(rows
        .into_iter()
        .map(|row| BinItemEntry {
            low_stock: row.is_low_stock(),
            item_id: row.item_id,
            name: row.name,
            unit: row.unit,
            quantity: row.quantity,
            notes: row.notes,
        })
        .collect())
}

/// The bin's active short code, empty when none.
pub(crate) async fn active_short_code(pool: &PgPool, bin_id: &str) -> Result<String, Status> {
    let code: Option<String> = sqlx::query_scalar(
        "SELECT short_code FROM qr_codes
         WHERE bin_id = $1::uuid AND revoked_at IS NULL
         ORDER BY issued_at DESC
         LIMIT 1",
    )
    .bind(bin_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| Status::internal(format!("Database error: {}", e)))?;
    Ok(code.unwrap_or_default())
}

impl BinServiceImpl {
    pub fn new(pool: PgPool, search: Option<Arc<SearchEngine>>, qr_base_url: String) -> Self {
        Self {
            pool,
            search,
            qr_base_url,
        }
    }

    fn get_authenticated_user<T>(request: &Request<T>) -> Result<AuthenticatedUser, Status> {
        request
            .extensions()
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| Status::unauthenticated("Authentication required"))
    }

    async fn index_bin(&self, bin: &BinModel) {
        if let Some(engine) = &self.search {
            if let Err(e) = engine.index_bin(bin).await {
                tracing::warn!("Search indexing failed for bin {}: {}", bin.id, e);
            }
        }
    }

    async fn contents_response(&self, bin_id: &str) -> Result<BinContentsResponse, Status> {
        Ok(BinContentsResponse {
            bin_id: bin_id.to_string(),
            items: fetch_bin_contents(&self.pool, bin_id).await?,
        })
    }

    /// The item must exist in the caller's organization.
    async fn verify_item(&self, org_id: &str, item_id: &str) -> Result<(), Status> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM items
                WHERE id = $1::uuid AND organization_id = $2::uuid AND deleted_at IS NULL)",
        )
        .bind(item_id)
        .bind(org_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;
        if !exists {
            return Err(Status::not_found("Item not found"));
        }
        Ok(())
    }
}

#[tonic::async_trait]
impl BinService for BinServiceImpl {
    async fn create_bin(
        &self,
        request: Request<CreateBinRequest>,
    ) -> Result<Response<BinResponse>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        if req.label.is_empty() {
            return Err(Status::invalid_argument("label is required"));
        }

        let bin: BinModel = sqlx::query_as(
            "INSERT INTO bins (organization_id, user_id, label, location, description)
             VALUES ($1::uuid, $2::uuid, $3, $4, $5)
             RETURNING id::text, organization_id::text, user_id::text, label, location,
                       description, created_at, updated_at",
        )
        .bind(&auth_user.org_id)
        .bind(&auth_user.user_id)
        .bind(&req.label)
        .bind(&req.location)
        .bind(&req.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if e.to_string().contains("unique") || e.to_string().contains("duplicate") {
                Status::already_exists("A bin with this label already exists")
            } else {
                Status::internal(format!("Failed to create bin: {}", e))
            }
        })?;

        // Every bin gets a QR code up front so the label can be printed
        let issued = qr_service::issue_for_bin(
            &self.pool,
            &auth_user.org_id,
            &bin.id,
            &self.qr_base_url,
            None,
        )
        .await?;

        self.index_bin(&bin).await;
        record_audit(
            &self.pool,
            &auth_user.org_id,
            &auth_user.user_id,
            "bin.create",
            "bin",
            &bin.id,
            serde_json::json!({ "label": bin.label }),
        )
        .await;

        Ok(Response::new(BinResponse {
            bin: Some(bin_to_proto(&bin, issued.short_code, 0)),
        }))
    }

    async fn get_bin(
        &self,
        request: Request<GetBinRequest>,
    ) -> Result<Response<GetBinResponse>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        if req.id.is_empty() {
            return Err(Status::invalid_argument("id is required"));
        }

        let bin = fetch_bin(&self.pool, &auth_user.org_id, &req.id).await?;
        let short_code = active_short_code(&self.pool, &bin.id).await?;
        let items = fetch_bin_contents(&self.pool, &bin.id).await?;
        let item_count = items.len() as i32;

        Ok(Response::new(GetBinResponse {
            bin: Some(bin_to_proto(&bin, short_code, item_count)),
            items,
        }))
    }

    async fn list_bins(
        &self,
        request: Request<ListBinsRequest>,
    ) -> Result<Response<ListBinsResponse>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        let page = req.page.max(1);
        let page_size = if req.page_size <= 0 {
            20
        } else {
            req.page_size.min(100)
        };
        let offset = (page - 1) as i64 * page_size as i64;
        let location_filter = format!("%{}%", req.location);

        type BinRow = (
            String,
            String,
            String,
            String,
            String,
            String,
            chrono::DateTime<chrono::Utc>,
            chrono::DateTime<chrono::Utc>,
            String,
            i64,
        );
        let rows: Vec<BinRow> = sqlx::query_as(
            "SELECT b.id::text, b.organization_id::text, b.user_id::text, b.label, b.location,
                    b.description, b.created_at, b.updated_at,
                    COALESCE(q.short_code, '') AS short_code,
                    COALESCE(c.cnt, 0) AS item_count
             FROM bins b
             LEFT JOIN LATERAL (
                 SELECT short_code FROM qr_codes
                 WHERE bin_id = b.id AND revoked_at IS NULL
                 ORDER BY issued_at DESC LIMIT 1) q ON true
             LEFT JOIN LATERAL (
                 SELECT COUNT(*) AS cnt FROM bin_items WHERE bin_id = b.id) c ON true
             WHERE b.organization_id = $1::uuid AND b.deleted_at IS NULL
               AND ($2 = '' OR b.location ILIKE $3)
             ORDER BY b.created_at DESC
             LIMIT $4 OFFSET $5",
        )
        .bind(&auth_user.org_id)
        .bind(&req.location)
        .bind(&location_filter)
        .bind(page_size as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bins b
             WHERE b.organization_id = $1::uuid AND b.deleted_at IS NULL
               AND ($2 = '' OR b.location ILIKE $3)",
        )
        .bind(&auth_user.org_id)
        .bind(&req.location)
        .bind(&location_filter)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        let bins = rows
            .into_iter()
            .map(
                |(
                    id,
                    _org_id,
                    _user_id,
                    label,
                    location,
                    description,
                    created_at,
                    updated_at,
                    short_code,
                    item_count,
                )| Bin {
                    id,
                    label,
                    location,
                    description,
                    short_code,
                    item_count: item_count as i32,
                    created_at: created_at.to_rfc3339(),
                    updated_at: updated_at.to_rfc3339(),
                },
            )
            .collect();

        Ok(Response::new(ListBinsResponse { bins, total }))
    }

    async fn update_bin(
        &self,
        request: Request<UpdateBinRequest>,
    ) -> Result<Response<BinResponse>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        if req.id.is_empty() {
            return Err(Status::invalid_argument("id is required"));
        }
        if req.label.is_empty() {
            return Err(Status::invalid_argument("label is required"));
        }

        let bin: Option<BinModel> = sqlx::query_as(
            "UPDATE bins SET label = $1, location = $2, description = $3, updated_at = NOW()
             WHERE id = $4::uuid AND organization_id = $5::uuid AND deleted_at IS NULL
             RETURNING id::text, organization_id::text, user_id::text, label, location,
                       description, created_at, updated_at",
        )
        .bind(&req.label)
        .bind(&req.location)
        .bind(&req.description)
        .bind(&req.id)
        .bind(&auth_user.org_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if e.to_string().contains("unique") || e.to_string().contains("duplicate") {
                Status::already_exists("A bin with this label already exists")
            } else {
                Status::internal(format!("Database error: {}", e))
            }
        })?;

        let bin = bin.ok_or_else(|| Status::not_found("Bin not found"))?;
        let short_code = active_short_code(&self.pool, &bin.id).await?;
        let items = fetch_bin_contents(&self.pool, &bin.id).await?;

        self.index_bin(&bin).await;
        record_audit(
            &self.pool,
            &auth_user.org_id,
            &auth_user.user_id,
            "bin.update",
            "bin",
            &bin.id,
            serde_json::json!({ "label": bin.label }),
        )
        .await;

        Ok(Response::new(BinResponse {
            bin: Some(bin_to_proto(&bin, short_code, items.len() as i32)),
        }))
    }

    async fn delete_bin(
        &self,
        request: Request<DeleteBinRequest>,
    ) -> Result<Response<Empty>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        if req.id.is_empty() {
            return Err(Status::invalid_argument("id is required"));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Status::internal(format!("Transaction error: {}", e)))?;

        let result = sqlx::query(
            "UPDATE bins SET deleted_at = NOW()
             WHERE id = $1::uuid AND organization_id = $2::uuid AND deleted_at IS NULL",
        )
        .bind(&req.id)
        .bind(&auth_user.org_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(Status::not_found("Bin not found"));
        }

        sqlx::query("UPDATE qr_codes SET revoked_at = NOW() WHERE bin_id = $1::uuid AND revoked_at IS NULL")
            .bind(&req.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        sqlx::query("DELETE FROM bin_items WHERE bin_id = $1::uuid")
            .bind(&req.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| Status::internal(format!("Transaction commit error: {}", e)))?;

        if let Some(engine) = &self.search {
            if let Err(e) = engine.remove_bin(&req.id).await {
                tracing::warn!("Search removal failed for bin {}: {}", req.id, e);
            }
        }
        record_audit(
            &self.pool,
            &auth_user.org_id,
            &auth_user.user_id,
            "bin.delete",
            "bin",
            &req.id,
            serde_json::json!({}),
        )
        .await;

        Ok(Response::new(Empty {}))
    }

    async fn add_item_to_bin(
        &self,
        request: Request<AddItemToBinRequest>,
    ) -> Result<Response<BinContentsResponse>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        if req.bin_id.is_empty() || req.item_id.is_empty() {
            return Err(Status::invalid_argument("bin_id and item_id are required"));
        }
        let quantity = if req.quantity == 0 { 1 } else { req.quantity };
        if quantity < 1 {
            return Err(Status::invalid_argument("quantity must be positive"));
        }

        fetch_bin(&self.pool, &auth_user.org_id, &req.bin_id).await?;
        self.verify_item(&auth_user.org_id, &req.item_id).await?;

        // Adding to an existing pair accumulates
        sqlx::query(
            "INSERT INTO bin_items (bin_id, item_id, quantity, notes)
             VALUES ($1::uuid, $2::uuid, $3, $4)
             ON CONFLICT (bin_id, item_id) DO UPDATE
                 SET quantity = bin_items.quantity + EXCLUDED.quantity,
                     notes = EXCLUDED.notes,
                     updated_at = NOW()",
        )
        .bind(&req.bin_id)
        .bind(&req.item_id)
        .bind(quantity)
        .bind(&req.notes)
        .execute(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        record_audit(
            &self.pool,
            &auth_user.org_id,
            &auth_user.user_id,
            "bin.add_item",
            "bin",
            &req.bin_id,
            serde_json::json!({ "item_id": req.item_id, "quantity": quantity }),
        )
        .await;

        Ok(Response::new(self.contents_response(&req.bin_id).await?))
    }

    async fn update_bin_item(
        &self,
        request: Request<UpdateBinItemRequest>,
    ) -> Result<Response<BinContentsResponse>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        if req.bin_id.is_empty() || req.item_id.is_empty() {
            return Err(Status::invalid_argument("bin_id and item_id are required"));
        }
        if req.quantity < 1 {
            return Err(Status::invalid_argument("quantity must be at least 1"));
        }

        fetch_bin(&self.pool, &auth_user.org_id, &req.bin_id).await?;

        let result = sqlx::query(
            "UPDATE bin_items SET quantity = $1, notes = $2, updated_at = NOW()
             WHERE bin_id = $3::uuid AND item_id = $4::uuid",
        )
        .bind(req.quantity)
        .bind(&req.notes)
        .bind(&req.bin_id)
        .bind(&req.item_id)
        .execute(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(Status::not_found("Item is not in this bin"));
        }

        Ok(Response::new(self.contents_response(&req.bin_id).await?))
    }

    async fn remove_item_from_bin(
        &self,
        request: Request<RemoveItemFromBinRequest>,
    ) -> Result<Response<BinContentsResponse>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        if req.bin_id.is_empty() || req.item_id.is_empty() {
            return Err(Status::invalid_argument("bin_id and item_id are required"));
        }

        fetch_bin(&self.pool, &auth_user.org_id, &req.bin_id).await?;

        let current: Option<i32> = sqlx::query_scalar(
            "SELECT quantity FROM bin_items WHERE bin_id = $1::uuid AND item_id = $2::uuid",
        )
        .bind(&req.bin_id)
        .bind(&req.item_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        let current = current.ok_or_else(|| Status::not_found("Item is not in this bin"))?;

        // Zero means "remove entirely"
        let to_remove = if req.quantity <= 0 { current } else { req.quantity };

        if to_remove >= current {
            sqlx::query("DELETE FROM bin_items WHERE bin_id = $1::uuid AND item_id = $2::uuid")
                .bind(&req.bin_id)
                .bind(&req.item_id)
                .execute(&self.pool)
                .await
                .map_err(|e| Status::internal(format!("Database error: {}", e)))?;
        } else {
            sqlx::query(
                "UPDATE bin_items SET quantity = quantity - $1, updated_at = NOW()
                 WHERE bin_id = $2::uuid AND item_id = $3::uuid",
            )
            .bind(to_remove)
            .bind(&req.bin_id)
            .bind(&req.item_id)
            .execute(&self.pool)
            .await
            .map_err(|e| Status::internal(format!("Database error: {}", e)))?;
        }

        record_audit(
            &self.pool,
            &auth_user.org_id,
            &auth_user.user_id,
            "bin.remove_item",
            "bin",
            &req.bin_id,
            serde_json::json!({ "item_id": req.item_id, "quantity": to_remove }),
        )
        .await;

        Ok(Response::new(self.contents_response(&req.bin_id).await?))
    }
}
