use sqlx::PgPool;
use tonic::{Request, Response, Status};
use uuid::Uuid;

use crate::db::record_audit;
use crate::middleware::AuthenticatedUser;
use crate::models::CategoryModel;
use crate::proto::categories::category_service_server::CategoryService;
use crate::proto::categories::{
    Category, CategoryResponse, CreateCategoryRequest, DeleteCategoryRequest, GetCategoryRequest,
    ListCategoriesResponse, UpdateCategoryRequest,
};
use crate::proto::common::Empty;

pub struct CategoryServiceImpl {
    pool: PgPool,
}

fn category_to_proto(model: &CategoryModel) -> Category {
    Category {
        id: model.id.to_string(),
        name: model.name.clone(),
        parent_id: model
            .parent_id
            .map(|p| p.to_string())
            .unwrap_or_default(),
        path: model.path.iter().map(|p| p.to_string()).collect(),
        created_at: model.created_at.to_rfc3339(),
    }
}

fn parse_uuid(value: &str, field: &str) -> Result<Uuid, Status> {
    value
        .parse()
        .map_err(|_| Status::invalid_argument(format!("{} must be a UUID", field)))
}

/// Sibling names share a unique index; its violation is a caller error,
/// not a server fault.
fn is_unique_violation(message: &str) -> bool {
    message.contains("unique") || message.contains("duplicate")
}

fn name_conflict_status(e: sqlx::Error, verb: &str) -> Status {
    if is_unique_violation(&e.to_string()) {
        Status::already_exists("A category with this name already exists under the same parent")
    } else {
        Status::internal(format!("Failed to {} category: {}", verb, e))
    }
}

const CATEGORY_COLUMNS: &str = "id, organization_id, name, parent_id, path, created_at";

impl CategoryServiceImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn get_authenticated_user<T>(request: &Request<T>) -> Result<AuthenticatedUser, Status> {
        request
            .extensions()
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| Status::unauthenticated("Authentication required"))
    }

    async fn fetch_category(&self, org_id: &str, id: Uuid) -> Result<CategoryModel, Status> {
        sqlx::query_as::<_, CategoryModel>(&format!(
            "SELECT {} FROM categories WHERE id = $1 AND organization_id = $2::uuid",
            CATEGORY_COLUMNS
        ))
        .bind(id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?
        .ok_or_else(|| Status::not_found("Category not found"))
    }
}

#[tonic::async_trait]
impl CategoryService for CategoryServiceImpl {
    async fn create_category(
        &self,
        request: Request<CreateCategoryRequest>,
    ) -> Result<Response<CategoryResponse>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        if req.name.is_empty() {
            return Err(Status::invalid_argument("name is required"));
        }

        let (parent_id, path) = if req.parent_id.is_empty() {
            (None, Vec::new())
        } else {
            let parent_id = parse_uuid(&req.parent_id, "parent_id")?;
            let parent = self.fetch_category(&auth_user.org_id, parent_id).await?;
            (Some(parent.id), parent.child_path())
        };

        let category: CategoryModel = sqlx::query_as(&format!(
            "INSERT INTO categories (organization_id, name, parent_id, path)
             VALUES ($1::uuid, $2, $3, $4)
             RETURNING {}",
            CATEGORY_COLUMNS
        ))
        .bind(&auth_user.org_id)
        .bind(&req.name)
        .bind(parent_id)
        .bind(&path)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| name_conflict_status(e, "create"))?;

        record_audit(
            &self.pool,
            &auth_user.org_id,
            &auth_user.user_id,
            "category.create",
            "category",
            &category.id.to_string(),
            serde_json::json!({ "name": category.name }),
        )
        .await;

        Ok(Response::new(CategoryResponse {
            category: Some(category_to_proto(&category)),
        }))
    }

    async fn get_category(
        &self,
        request: Request<GetCategoryRequest>,
    ) -> Result<Response<CategoryResponse>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        let id = parse_uuid(&req.id, "id")?;
        let category = self.fetch_category(&auth_user.org_id, id).await?;

        Ok(Response::new(CategoryResponse {
            category: Some(category_to_proto(&category)),
        }))
    }

    async fn list_categories(
        &self,
        request: Request<Empty>,
    ) -> Result<Response<ListCategoriesResponse>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;

        // Parents before children, so a client can rebuild the tree in one pass
        let rows: Vec<CategoryModel> = sqlx::query_as(&format!(
            "SELECT {} FROM categories
             WHERE organization_id = $1::uuid
             ORDER BY cardinality(path), name",
            CATEGORY_COLUMNS
        ))
        .bind(&auth_user.org_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        Ok(Response::new(ListCategoriesResponse {
            categories: rows.iter().map(category_to_proto).collect(),
        }))
    }

    async fn update_category(
        &self,
        request: Request<UpdateCategoryRequest>,
    ) -> Result<Response<CategoryResponse>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        if req.name.is_empty() {
            return Err(Status::invalid_argument("name is required"));
        }
        let id = parse_uuid(&req.id, "id")?;
        let category = self.fetch_category(&auth_user.org_id, id).await?;

        let (new_parent_id, new_path) = if req.parent_id.is_empty() {
            (None, Vec::new())
        } else {
            let parent_id = parse_uuid(&req.parent_id, "parent_id")?;
            let parent = self.fetch_category(&auth_user.org_id, parent_id).await?;
            if category.would_cycle(parent.id, &parent.path) {
                return Err(Status::invalid_argument(
                    "Cannot move a category under itself or one of its descendants",
                ));
            }
            (Some(parent.id), parent.child_path())
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Status::internal(format!("Transaction error: {}", e)))?;

        let updated: CategoryModel = sqlx::query_as(&format!(
            "UPDATE categories SET name = $1, parent_id = $2, path = $3
             WHERE id = $4 AND organization_id = $5::uuid
             RETURNING {}",
            CATEGORY_COLUMNS
        ))
        .bind(&req.name)
        .bind(new_parent_id)
        .bind(&new_path)
        .bind(category.id)
        .bind(&auth_user.org_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| name_conflict_status(e, "update"))?;

        // Rewrite descendant paths: new prefix plus each row's tail below
        // the moved category.
        sqlx::query(
            "UPDATE categories
             SET path = $1 || path[array_position(path, $2::uuid):]
             WHERE organization_id = $3::uuid AND path @> ARRAY[$2::uuid]",
        )
        .bind(&new_path)
        .bind(category.id)
        .bind(&auth_user.org_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| Status::internal(format!("Transaction commit error: {}", e)))?;

        record_audit(
            &self.pool,
            &auth_user.org_id,
            &auth_user.user_id,
            "category.update",
            "category",
            &updated.id.to_string(),
            serde_json::json!({ "name": updated.name }),
        )
        .await;

        Ok(Response::new(CategoryResponse {
            category: Some(category_to_proto(&updated)),
        }))
    }

    async fn delete_category(
        &self,
        request: Request<DeleteCategoryRequest>,
    ) -> Result<Response<Empty>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        let id = parse_uuid(&req.id, "id")?;
        self.fetch_category(&auth_user.org_id, id).await?;

        let children: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM categories
             WHERE parent_id = $1 AND organization_id = $2::uuid",
        )
        .bind(id)
        .bind(&auth_user.org_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;
        if children > 0 {
            return Err(Status::failed_precondition(
                "Category still has child categories",
            ));
        }

        let items: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM items
             WHERE category_id = $1 AND organization_id = $2::uuid AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(&auth_user.org_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;
        if items > 0 {
            return Err(Status::failed_precondition(
                "Category is still assigned to items",
            ));
        }

        sqlx::query("DELETE FROM categories WHERE id = $1 AND organization_id = $2::uuid")
            .bind(id)
            .bind(&auth_user.org_id)
            .execute(&self.pool)
            .await
            .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        record_audit(
            &self.pool,
            &auth_user.org_id,
            &auth_user.user_id,
            "category.delete",
            "category",
            &req.id,
            serde_json::json!({}),
        )
        .await;

        Ok(Response::new(Empty {}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    #[test]
    fn test_detects_postgres_duplicate_key_wording() {
        assert!(is_unique_violation(
            "duplicate key value violates unique constraint \"categories_name_key\""
        ));
        assert!(is_unique_violation("UNIQUE constraint failed".to_lowercase().as_str()));
        assert!(!is_unique_violation("connection reset by peer"));
    }

    #[test]
    fn test_sibling_name_conflict_maps_to_already_exists() {
        let e = sqlx::Error::Protocol(
            "duplicate key value violates unique constraint \"categories_name_key\"".to_string(),
        );
        assert_eq!(name_conflict_status(e, "create").code(), Code::AlreadyExists);

        let e = sqlx::Error::Protocol("deadlock detected".to_string());
        assert_eq!(name_conflict_status(e, "update").code(), Code::Internal);
    }
}
