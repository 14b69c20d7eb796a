use sqlx::PgPool;
use tonic::{Request, Response, Status};

use crate::db::record_audit;
use crate::middleware::AuthenticatedUser;
use crate::models::organization::{is_admin, ROLE_OWNER};
use crate::models::OrganizationModel;
use crate::proto::common::Empty;
use crate::proto::organization::organization_service_server::OrganizationService;
use crate::proto::organization::{
    CreateOrganizationRequest, DeleteOrganizationRequest, ListOrganizationsResponse, Organization,
    OrganizationResponse, UpdateOrganizationRequest,
};
use crate::services::auth_service::validate_slug;

pub struct OrganizationServiceImpl {
    pool: PgPool,
}

impl OrganizationServiceImpl {
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

    async fn role_in(&self, user_id: &str, org_id: &str) -> Result<String, Status> {
        let role: Option<String> = sqlx::query_scalar(
            "SELECT role FROM organization_members WHERE user_id = $1::uuid AND organization_id = $2::uuid",
        )
        .bind(user_id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        role.ok_or_else(|| Status::permission_denied("Not a member of this organization"))
    }
}

#[tonic::async_trait]
impl OrganizationService for OrganizationServiceImpl {
    async fn list_my_organizations(
        &self,
        request: Request<Empty>,
    ) -> Result<Response<ListOrganizationsResponse>, Status> {
        let user = Self::get_authenticated_user(&request)?;

        let rows: Vec<(String, String, String, String, chrono::DateTime<chrono::Utc>)> =
            sqlx::query_as(
                "SELECT o.id::text, o.name, o.slug, om.role, o.created_at
                 FROM organizations o
                 JOIN organization_members om ON om.organization_id = o.id
                 WHERE om.user_id = $1::uuid
                   AND o.deleted_at IS NULL
                 ORDER BY o.created_at",
            )
            .bind(&user.user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        let organizations = rows
            .into_iter()
            .map(|(id, name, slug, role, created_at)| Organization {
                id,
                name,
                slug,
                role,
                created_at: created_at.to_rfc3339(),
            })
            .collect();

        Ok(Response::new(ListOrganizationsResponse { organizations }))
    }

    async fn create_organization(
        &self,
        request: Request<CreateOrganizationRequest>,
    ) -> Result<Response<OrganizationResponse>, Status> {
        let user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        if req.name.is_empty() {
            return Err(Status::invalid_argument("name is required"));
        }
        validate_slug(&req.slug)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Status::internal(format!("Transaction error: {}", e)))?;

        let row: (String, chrono::DateTime<chrono::Utc>) = sqlx::query_as(
            "INSERT INTO organizations (name, slug) VALUES ($1, $2) RETURNING id::text, created_at",
        )
        .bind(&req.name)
        .bind(&req.slug)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if e.to_string().contains("unique") || e.to_string().contains("duplicate") {
                Status::already_exists("Organization slug already taken")
            } else {
                Status::internal(format!("Failed to create organization: {}", e))
            }
        })?;

        sqlx::query(
            "INSERT INTO organization_members (user_id, organization_id, role, is_default)
             VALUES ($1::uuid, $2::uuid, 'owner', false)",
        )
        .bind(&user.user_id)
        .bind(&row.0)
        .execute(&mut *tx)
        .await
        .map_err(|e| Status::internal(format!("Failed to create membership: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| Status::internal(format!("Transaction commit error: {}", e)))?;

        record_audit(
            &self.pool,
            &row.0,
            &user.user_id,
            "organization.create",
            "organization",
            &row.0,
            serde_json::json!({ "name": req.name, "slug": req.slug }),
        )
        .await;

        Ok(Response::new(OrganizationResponse {
            organization: Some(Organization {
                id: row.0,
                name: req.name,
                slug: req.slug,
                role: ROLE_OWNER.to_string(),
                created_at: row.1.to_rfc3339(),
            }),
        }))
    }

    async fn update_organization(
        &self,
        request: Request<UpdateOrganizationRequest>,
    ) -> Result<Response<OrganizationResponse>, Status> {
        let user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        if req.organization_id.is_empty() {
            return Err(Status::invalid_argument("organization_id is required"));
        }
        if req.name.is_empty() {
            return Err(Status::invalid_argument("name is required"));
        }
        validate_slug(&req.slug)?;

        let role = self.role_in(&user.user_id, &req.organization_id).await?;
        if !is_admin(&role) {
            return Err(Status::permission_denied("Admin role required"));
        }

        let row: Option<OrganizationModel> = sqlx::query_as(
            "UPDATE organizations SET name = $1, slug = $2, updated_at = NOW()
             WHERE id = $3::uuid AND deleted_at IS NULL
             RETURNING id::text, name, slug, created_at",
        )
        .bind(&req.name)
        .bind(&req.slug)
        .bind(&req.organization_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if e.to_string().contains("unique") || e.to_string().contains("duplicate") {
                Status::already_exists("Organization slug already taken")
            } else {
                Status::internal(format!("Database error: {}", e))
            }
        })?;

        let org = row.ok_or_else(|| Status::not_found("Organization not found"))?;

        record_audit(
            &self.pool,
            &org.id,
            &user.user_id,
            "organization.update",
            "organization",
            &org.id,
            serde_json::json!({ "name": org.name, "slug": org.slug }),
        )
        .await;

        Ok(Response::new(OrganizationResponse {
            organization: Some(Organization {
                created_at: org.created_at.to_rfc3339(),
                id: org.id,
                name: org.name,
                slug: org.slug,
                role,
            }),
        }))
    }

    async fn delete_organization(
        &self,
        request: Request<DeleteOrganizationRequest>,
    ) -> Result<Response<Empty>, Status> {
        let user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        if req.organization_id.is_empty() {
            return Err(Status::invalid_argument("organization_id is required"));
        }

        let role = self.role_in(&user.user_id, &req.organization_id).await?;
        if role != ROLE_OWNER {
            return Err(Status::permission_denied("Owner role required"));
        }

        let result = sqlx::query(
            "UPDATE organizations SET deleted_at = NOW()
             WHERE id = $1::uuid AND deleted_at IS NULL",
        )
        .bind(&req.organization_id)
        .execute(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(Status::not_found("Organization not found"));
        }

        record_audit(
            &self.pool,
            &req.organization_id,
            &user.user_id,
            "organization.delete",
            "organization",
            &req.organization_id,
            serde_json::json!({}),
        )
        .await;

        Ok(Response::new(Empty {}))
    }
}
