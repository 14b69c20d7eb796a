use sqlx::PgPool;
use tonic::{Request, Response, Status};

use crate::middleware::AuthenticatedUser;
use crate::models::SessionModel;
use crate::proto::auth::session_service_server::SessionService;
use crate::proto::auth::{ListSessionsResponse, RevokeSessionRequest, Session};
use crate::proto::common::Empty;

pub struct SessionServiceImpl {
    pool: PgPool,
}

impl SessionServiceImpl {
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
}

#[tonic::async_trait]
impl SessionService for SessionServiceImpl {
    async fn list_sessions(
        &self,
        request: Request<Empty>,
    ) -> Result<Response<ListSessionsResponse>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;

        let rows: Vec<SessionModel> = sqlx::query_as(
            "SELECT id::text, user_id::text, user_agent, created_at, expires_at
             FROM sessions
             WHERE user_id = $1::uuid AND revoked_at IS NULL AND expires_at > NOW()
             ORDER BY created_at DESC",
        )
        .bind(&auth_user.user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        let sessions = rows
            .into_iter()
            .map(|s| Session {
                current: s.id == auth_user.session_id,
                id: s.id,
                user_agent: s.user_agent,
                created_at: s.created_at.to_rfc3339(),
                expires_at: s.expires_at.to_rfc3339(),
            })
            .collect();

        Ok(Response::new(ListSessionsResponse { sessions }))
    }

    async fn revoke_session(
        &self,
        request: Request<RevokeSessionRequest>,
    ) -> Result<Response<Empty>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        if req.session_id.is_empty() {
            return Err(Status::invalid_argument("session_id is required"));
        }

        let result = sqlx::query(
            "UPDATE sessions SET revoked_at = NOW()
             WHERE id = $1::uuid AND user_id = $2::uuid AND revoked_at IS NULL",
        )
        .bind(&req.session_id)
        .bind(&auth_user.user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(Status::not_found("Session not found"));
        }

        tracing::info!(
            "Session {} revoked by user {}",
            req.session_id,
            auth_user.user_id
        );
        Ok(Response::new(Empty {}))
    }

    async fn revoke_all_sessions(
        &self,
        request: Request<Empty>,
    ) -> Result<Response<Empty>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;

        // Every session except the one making this call
        sqlx::query(
            "UPDATE sessions SET revoked_at = NOW()
             WHERE user_id = $1::uuid AND id <> $2::uuid AND revoked_at IS NULL",
        )
        .bind(&auth_user.user_id)
        .bind(&auth_user.session_id)
        .execute(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        Ok(Response::new(Empty {}))
    }
}
