use std::sync::Arc;

use sqlx::PgPool;
use tonic::{Request, Response, Status};
use uuid::Uuid;

use crate::db::record_audit;
use crate::middleware::AuthenticatedUser;
use crate::models::ItemModel;
use crate::proto::common::Empty;
use crate::proto::items::item_service_server::ItemService;
use crate::proto::items::{
    CreateItemRequest, DeleteItemRequest, GetItemRequest, Item, ItemResponse, ListItemsRequest,
    ListItemsResponse, UpdateItemRequest, UploadItemImageRequest, UploadItemImageResponse,
};
use crate::search::SearchEngine;
use crate::storage::{image_extension, key_from_image_url, StorageBackend};

const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

pub struct ItemServiceImpl {
    pool: PgPool,
    search: Option<Arc<SearchEngine>>,
    storage: Option<Arc<dyn StorageBackend>>,
    asset_base_url: Option<String>,
}

pub(crate) fn item_to_proto(model: &ItemModel) -> Item {
    Item {
        id: model.id.clone(),
        name: model.name.clone(),
        description: model.description.clone(),
        quantity: model.quantity,
        min_quantity: model.min_quantity,
        unit: model.unit.clone(),
        category_id: model.category_id.clone().unwrap_or_default(),
        image_url: model.image_url.clone().unwrap_or_default(),
        low_stock: model.is_low_stock(),
        created_at: model.created_at.to_rfc3339(),
        updated_at: model.updated_at.to_rfc3339(),
    }
}

const ITEM_COLUMNS: &str = "id::text, organization_id::text, name, description, quantity, \
     min_quantity, unit, category_id::text, image_url, created_at, updated_at";

impl ItemServiceImpl {
    pub fn new(
        pool: PgPool,
        search: Option<Arc<SearchEngine>>,
        storage: Option<Arc<dyn StorageBackend>>,
        asset_base_url: Option<String>,
    ) -> Self {
        Self {
            pool,
            search,
            storage,
            asset_base_url,
        }
    }

    fn get_authenticated_user<T>(request: &Request<T>) -> Result<AuthenticatedUser, Status> {
        request
            .extensions()
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| Status::unauthenticated("Authentication required"))
    }

    async fn fetch_item(&self, org_id: &str, item_id: &str) -> Result<ItemModel, Status> {
        sqlx::query_as::<_, ItemModel>(&format!(
            "SELECT {} FROM items
             WHERE id = $1::uuid AND organization_id = $2::uuid AND deleted_at IS NULL",
            ITEM_COLUMNS
        ))
        .bind(item_id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?
        .ok_or_else(|| Status::not_found("Item not found"))
    }

    /// The category, when given, must belong to the caller's organization.
    async fn verify_category(&self, org_id: &str, category_id: &str) -> Result<(), Status> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM categories
                WHERE id = $1::uuid AND organization_id = $2::uuid)",
        )
        .bind(category_id)
        .bind(org_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;
        if !exists {
            return Err(Status::not_found("Category not found"));
        }
        Ok(())
    }

    async fn index_item(&self, item: &ItemModel) {
        if let Some(engine) = &self.search {
            if let Err(e) = engine.index_item(item).await {
                tracing::warn!("Search indexing failed for item {}: {}", item.id, e);
            }
        }
    }

    fn validate_fields(name: &str, quantity: i32, min_quantity: i32) -> Result<(), Status> {
        if name.is_empty() {
            return Err(Status::invalid_argument("name is required"));
        }
        if quantity < 0 {
            return Err(Status::invalid_argument("quantity must not be negative"));
        }
        if min_quantity < 0 {
            return Err(Status::invalid_argument("min_quantity must not be negative"));
        }
        Ok(())
    }
}

#[tonic::async_trait]
impl ItemService for ItemServiceImpl {
    async fn create_item(
        &self,
        request: Request<CreateItemRequest>,
    ) -> Result<Response<ItemResponse>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        Self::validate_fields(&req.name, req.quantity, req.min_quantity)?;
        let category_id = if req.category_id.is_empty() {
            None
        } else {
            self.verify_category(&auth_user.org_id, &req.category_id)
                .await?;
            Some(req.category_id.clone())
        };

        let item: ItemModel = sqlx::query_as(&format!(
            "INSERT INTO items (organization_id, name, description, quantity, min_quantity, unit, category_id)
             VALUES ($1::uuid, $2, $3, $4, $5, $6, $7::uuid)
             RETURNING {}",
            ITEM_COLUMNS
        ))
        .bind(&auth_user.org_id)
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.quantity)
        .bind(req.min_quantity)
        .bind(&req.unit)
        .bind(category_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Failed to create item: {}", e)))?;

        self.index_item(&item).await;
        record_audit(
            &self.pool,
            &auth_user.org_id,
            &auth_user.user_id,
            "item.create",
            "item",
            &item.id,
            serde_json::json!({ "name": item.name }),
        )
        .await;

        Ok(Response::new(ItemResponse {
            item: Some(item_to_proto(&item)),
        }))
    }

    async fn get_item(
        &self,
        request: Request<GetItemRequest>,
    ) -> Result<Response<ItemResponse>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        if req.id.is_empty() {
            return Err(Status::invalid_argument("id is required"));
        }

        let item = self.fetch_item(&auth_user.org_id, &req.id).await?;
        Ok(Response::new(ItemResponse {
            item: Some(item_to_proto(&item)),
        }))
    }

    async fn list_items(
        &self,
        request: Request<ListItemsRequest>,
    ) -> Result<Response<ListItemsResponse>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        let page = req.page.max(1);
        let page_size = if req.page_size <= 0 {
            20
        } else {
            req.page_size.min(100)
        };
        let offset = (page - 1) as i64 * page_size as i64;
        let category_filter = if req.category_id.is_empty() {
            None
        } else {
            Some(req.category_id.clone())
        };

        let rows: Vec<ItemModel> = sqlx::query_as(&format!(
            "SELECT {} FROM items
             WHERE organization_id = $1::uuid AND deleted_at IS NULL
               AND ($2::uuid IS NULL OR category_id = $2::uuid)
               AND (NOT $3 OR (min_quantity > 0 AND quantity < min_quantity))
             ORDER BY name
             LIMIT $4 OFFSET $5",
            ITEM_COLUMNS
        ))
        .bind(&auth_user.org_id)
        .bind(&category_filter)
        .bind(req.low_stock_only)
        .bind(page_size as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM items
             WHERE organization_id = $1::uuid AND deleted_at IS NULL
               AND ($2::uuid IS NULL OR category_id = $2::uuid)
               AND (NOT $3 OR (min_quantity > 0 AND quantity < min_quantity))",
        )
        .bind(&auth_user.org_id)
        .bind(&category_filter)
        .bind(req.low_stock_only)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        let items = rows.iter().map(item_to_proto).collect();
        Ok(Response::new(ListItemsResponse { items, total }))
    }

    async fn update_item(
        &self,
        request: Request<UpdateItemRequest>,
    ) -> Result<Response<ItemResponse>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        if req.id.is_empty() {
            return Err(Status::invalid_argument("id is required"));
        }
        Self::validate_fields(&req.name, req.quantity, req.min_quantity)?;
        let category_id = if req.category_id.is_empty() {
            None
        } else {
            self.verify_category(&auth_user.org_id, &req.category_id)
                .await?;
            Some(req.category_id.clone())
        };

        let item: Option<ItemModel> = sqlx::query_as(&format!(
            "UPDATE items
             SET name = $1, description = $2, quantity = $3, min_quantity = $4, unit = $5,
                 category_id = $6::uuid, updated_at = NOW()
             WHERE id = $7::uuid AND organization_id = $8::uuid AND deleted_at IS NULL
             RETURNING {}",
            ITEM_COLUMNS
        ))
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.quantity)
        .bind(req.min_quantity)
        .bind(&req.unit)
        .bind(category_id)
        .bind(&req.id)
        .bind(&auth_user.org_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        let item = item.ok_or_else(|| Status::not_found("Item not found"))?;

        self.index_item(&item).await;
        record_audit(
            &self.pool,
            &auth_user.org_id,
            &auth_user.user_id,
            "item.update",
            "item",
            &item.id,
            serde_json::json!({ "name": item.name }),
        )
        .await;

        Ok(Response::new(ItemResponse {
            item: Some(item_to_proto(&item)),
        }))
    }

    async fn delete_item(
        &self,
        request: Request<DeleteItemRequest>,
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
            "UPDATE items SET deleted_at = NOW()
             WHERE id = $1::uuid AND organization_id = $2::uuid AND deleted_at IS NULL",
        )
        .bind(&req.id)
        .bind(&auth_user.org_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(Status::not_found("Item not found"));
        }

        // A deleted item disappears from every bin it was placed in
        sqlx::query("DELETE FROM bin_items WHERE item_id = $1::uuid")
            .bind(&req.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| Status::internal(format!("Transaction commit error: {}", e)))?;

        if let Some(engine) = &self.search {
            if let Err(e) = engine.remove_item(&req.id).await {
                tracing::warn!("Search removal failed for item {}: {}", req.id, e);
            }
        }
        record_audit(
            &self.pool,
            &auth_user.org_id,
            &auth_user.user_id,
            "item.delete",
            "item",
            &req.id,
            serde_json::json!({}),
        )
        .await;

        Ok(Response::new(Empty {}))
    }

    async fn upload_item_image(
        &self,
        request: Request<UploadItemImageRequest>,
    ) -> Result<Response<UploadItemImageResponse>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        if req.item_id.is_empty() {
            return Err(Status::invalid_argument("item_id is required"));
        }
        if req.data.is_empty() {
            return Err(Status::invalid_argument("data is required"));
        }
        if req.data.len() > MAX_IMAGE_BYTES {
            return Err(Status::invalid_argument("Image exceeds the 5 MiB limit"));
        }
        let extension = image_extension(&req.content_type)
            .ok_or_else(|| Status::invalid_argument("Unsupported image content type"))?;

        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| Status::failed_precondition("Image storage is not configured"))?;

        let item = self.fetch_item(&auth_user.org_id, &req.item_id).await?;

        let key = format!(
            "items/{}/{}.{}",
            auth_user.org_id,
            Uuid::new_v4(),
            extension
        );
        storage
            .upload(&key, &req.data, &req.content_type)
            .await
            .map_err(Status::from)?;

        let image_url = match &self.asset_base_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), key),
            None => format!("s3://{}/{}", storage.bucket(), key),
        };

        sqlx::query(
            "UPDATE items SET image_url = $1, updated_at = NOW()
             WHERE id = $2::uuid AND organization_id = $3::uuid",
        )
        .bind(&image_url)
        .bind(&req.item_id)
        .bind(&auth_user.org_id)
        .execute(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        // The replaced object is deleted best-effort once the row points at
        // the new image; a leftover file never blocks the upload.
        if let Some(old_url) = &item.image_url {
            if let Some(old_key) =
                key_from_image_url(old_url, storage.bucket(), self.asset_base_url.as_deref())
            {
                if old_key != key {
                    if let Err(e) = storage.delete(&old_key).await {
                        tracing::warn!("Failed to delete replaced image {}: {}", old_key, e);
                    }
                }
            }
        }

        record_audit(
            &self.pool,
            &auth_user.org_id,
            &auth_user.user_id,
            "item.upload_image",
            "item",
            &req.item_id,
            serde_json::json!({ "key": key }),
        )
        .await;

        Ok(Response::new(UploadItemImageResponse { image_url }))
    }
}
