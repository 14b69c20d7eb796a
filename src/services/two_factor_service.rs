use chrono::Utc;
use sqlx::PgPool;
use tonic::{Request, Response, Status};

use crate::db::record_audit;
use crate::middleware::AuthenticatedUser;
use crate::models::UserModel;
use crate::otp;
use crate::proto::auth::two_factor_service_server::TwoFactorService;
use crate::proto::auth::{
    BeginSetupResponse, ConfirmSetupRequest, ConfirmSetupResponse, DisableTwoFactorRequest,
};
use crate::proto::common::Empty;
use crate::services::auth_service::{sha256_hex, verify_password};

const RECOVERY_CODE_COUNT: usize = 10;
const OTP_ISSUER: &str = "Binventory";

pub struct TwoFactorServiceImpl {
    pool: PgPool,
}

impl TwoFactorServiceImpl {
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
impl TwoFactorService for TwoFactorServiceImpl {
    async fn begin_setup(
        &self,
        request: Request<Empty>,
    ) -> Result<Response<BeginSetupResponse>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;

        let user: UserModel = sqlx::query_as(
            "SELECT id::text, email, display_name, totp_enabled, created_at
             FROM users WHERE id = $1::uuid AND deleted_at IS NULL",
        )
        .bind(&auth_user.user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?
        .ok_or_else(|| Status::not_found("User not found"))?;

        if user.totp_enabled {
            return Err(Status::failed_precondition(
                "Two-factor authentication is already enabled",
            ));
        }

        let secret = otp::generate_secret().map_err(Status::from)?;

        // Stored disabled until ConfirmSetup proves the authenticator works
        sqlx::query("UPDATE users SET totp_secret = $1, updated_at = NOW() WHERE id = $2::uuid")
            .bind(&secret)
            .bind(&auth_user.user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        let otpauth_url = otp::otpauth_url(&secret, &user.email, OTP_ISSUER);
        Ok(Response::new(BeginSetupResponse { secret, otpauth_url }))
    }

    async fn confirm_setup(
        &self,
        request: Request<ConfirmSetupRequest>,
    ) -> Result<Response<ConfirmSetupResponse>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        if req.code.is_empty() {
            return Err(Status::invalid_argument("code is required"));
        }

        let row: (Option<String>, bool) = sqlx::query_as(
            "SELECT totp_secret, totp_enabled FROM users WHERE id = $1::uuid AND deleted_at IS NULL",
        )
        .bind(&auth_user.user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?
        .ok_or_else(|| Status::not_found("User not found"))?;

        let (secret, totp_enabled) = row;
        if totp_enabled {
            return Err(Status::failed_precondition(
                "Two-factor authentication is already enabled",
            ));
        }
        let secret = secret.ok_or_else(|| {
            Status::failed_precondition("No pending two-factor setup; call BeginSetup first")
        })?;

        let now = Utc::now().timestamp() as u64;
        let valid = otp::verify_totp(&secret, &req.code, now).map_err(Status::from)?;
        if !valid {
            return Err(Status::unauthenticated("Invalid two-factor code"));
        }

        let recovery_codes = otp::generate_recovery_codes(RECOVERY_CODE_COUNT).map_err(Status::from)?;
        let hashes: Vec<String> = recovery_codes.iter().map(|c| sha256_hex(c)).collect();

        sqlx::query(
            "UPDATE users SET totp_enabled = true, recovery_codes = $1, updated_at = NOW()
             WHERE id = $2::uuid",
        )
        .bind(&hashes)
        .bind(&auth_user.user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        record_audit(
            &self.pool,
            &auth_user.org_id,
            &auth_user.user_id,
            "two_factor.enable",
            "user",
            &auth_user.user_id,
            serde_json::json!({}),
        )
        .await;

        Ok(Response::new(ConfirmSetupResponse { recovery_codes }))
    }

    async fn disable(
        &self,
        request: Request<DisableTwoFactorRequest>,
    ) -> Result<Response<Empty>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        if req.password.is_empty() {
            return Err(Status::invalid_argument("password is required"));
        }

        let row: (String, bool) = sqlx::query_as(
            "SELECT password_hash, totp_enabled FROM users WHERE id = $1::uuid AND deleted_at IS NULL",
        )
        .bind(&auth_user.user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?
        .ok_or_else(|| Status::not_found("User not found"))?;

        let (password_hash, totp_enabled) = row;
        if !totp_enabled {
            return Err(Status::failed_precondition(
                "Two-factor authentication is not enabled",
            ));
        }
        verify_password(&req.password, &password_hash)?;

        sqlx::query(
            "UPDATE users SET totp_enabled = false, totp_secret = NULL, recovery_codes = '{}',
                 updated_at = NOW()
             WHERE id = $1::uuid",
        )
        .bind(&auth_user.user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        record_audit(
            &self.pool,
            &auth_user.org_id,
            &auth_user.user_id,
            "two_factor.disable",
            "user",
            &auth_user.user_id,
            serde_json::json!({}),
        )
        .await;

        Ok(Response::new(Empty {}))
    }
}
