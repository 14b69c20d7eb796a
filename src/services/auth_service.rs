use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use std::sync::OnceLock;
use tonic::{Request, Response, Status};
use uuid::Uuid;

use crate::db::record_audit;
use crate::middleware::AuthenticatedUser;
use crate::otp;
use crate::proto::auth::auth_service_server::AuthService;
use crate::proto::auth::{
    AuthResponse, LoginRequest, RegisterRequest, SwitchOrganizationRequest, ValidateTokenRequest,
    ValidateTokenResponse,
};
use crate::proto::common::Empty;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub org: String,
    pub email: String,
    /// Session id backing this token; revoking the session kills the token.
    pub sid: String,
    pub exp: i64,
    pub iat: i64,
}

/// Session/JWT lifetime.
const SESSION_HOURS: i64 = 24;

static SLUG_RE: OnceLock<Regex> = OnceLock::new();

pub(crate) fn validate_slug(slug: &str) -> Result<(), Status> {
    let re = SLUG_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9-]{1,62}$").unwrap());
    if re.is_match(slug) {
        Ok(())
    } else {
        Err(Status::invalid_argument(
            "Slug must be 2-63 chars of lowercase letters, digits and hyphens",
        ))
    }
}

pub(crate) fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

pub(crate) fn hash_password(password: &str) -> Result<String, Status> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| Status::internal(format!("Password hashing error: {}", e)))
}

pub(crate) fn verify_password(password: &str, stored_hash: &str) -> Result<(), Status> {
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|_| Status::internal("Invalid password hash in database"))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| Status::unauthenticated("Invalid credentials"))
}

/// Issues a JWT bound to a fresh session row.
pub(crate) async fn issue_session(
    pool: &PgPool,
    jwt_secret: &str,
    user_id: &str,
    org_id: &str,
    email: &str,
    user_agent: &str,
) -> Result<AuthResponse, Status> {
    let session_id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let exp = now + chrono::Duration::hours(SESSION_HOURS);
    let claims = Claims {
        sub: user_id.to_string(),
        org: org_id.to_string(),
        email: email.to_string(),
        sid: session_id.clone(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|e| Status::internal(format!("JWT error: {}", e)))?;

    sqlx::query(
        "INSERT INTO sessions (id, user_id, token_hash, user_agent, expires_at)
         VALUES ($1::uuid, $2::uuid, $3, $4, $5)",
    )
    .bind(&session_id)
    .bind(user_id)
    .bind(sha256_hex(&token))
    .bind(user_agent)
    .bind(exp)
    .execute(pool)
    .await
    .map_err(|e| Status::internal(format!("Failed to create session: {}", e)))?;

    Ok(AuthResponse {
        token,
        expires_at: exp.to_rfc3339(),
        user_id: user_id.to_string(),
        organization_id: org_id.to_string(),
    })
}

fn user_agent_from_request<T>(request: &Request<T>) -> String {
    request
        .metadata()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub struct AuthServiceImpl {
    pool: PgPool,
    jwt_secret: String,
}

impl AuthServiceImpl {
    pub fn new(pool: PgPool, jwt_secret: String) -> Self {
        Self { pool, jwt_secret }
    }

    fn get_authenticated_user<T>(request: &Request<T>) -> Result<AuthenticatedUser, Status> {
        request
            .extensions()
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| Status::unauthenticated("Authentication required"))
    }

    /// Checks a two-factor code against the TOTP secret, falling back to the
    /// user's single-use recovery codes. A consumed recovery code is removed.
    async fn check_two_factor(
        &self,
        user_id: &str,
        secret: &str,
        recovery_codes: &[String],
        code: &str,
    ) -> Result<(), Status> {
        let now = Utc::now().timestamp() as u64;
        let totp_ok = otp::verify_totp(secret, code, now)
            .map_err(|e| Status::internal(format!("TOTP error: {}", e)))?;
        if totp_ok {
            return Ok(());
        }

        let code_hash = sha256_hex(&code.to_uppercase());
        if recovery_codes.iter().any(|c| c == &code_hash) {
            sqlx::query(
                "UPDATE users SET recovery_codes = array_remove(recovery_codes, $1), updated_at = NOW()
                 WHERE id = $2::uuid",
            )
            .bind(&code_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| Status::internal(format!("Database error: {}", e)))?;
            tracing::info!("Recovery code consumed for user {}", user_id);
            return Ok(());
        }

        Err(Status::unauthenticated("Invalid two-factor code"))
    }
}

#[tonic::async_trait]
impl AuthService for AuthServiceImpl {
    async fn register(
        &self,
        request: Request<RegisterRequest>,
    ) -> Result<Response<AuthResponse>, Status> {
        let user_agent = user_agent_from_request(&request);
        let req = request.into_inner();

        if req.email.is_empty() || !req.email.contains('@') {
            return Err(Status::invalid_argument("A valid email is required"));
        }
        if req.password.len() < 8 {
            return Err(Status::invalid_argument(
                "Password must be at least 8 characters",
            ));
        }
        if req.organization_name.is_empty() {
            return Err(Status::invalid_argument("Organization name is required"));
        }
        validate_slug(&req.organization_slug)?;

        let password_hash = hash_password(&req.password)?;
        let display_name = if req.display_name.is_empty() {
            req.email.clone()
        } else {
            req.display_name.clone()
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Status::internal(format!("Transaction error: {}", e)))?;

        let (user_id,): (String,) = sqlx::query_as(
            "INSERT INTO users (email, display_name, password_hash) VALUES ($1, $2, $3) RETURNING id::text",
        )
        .bind(&req.email)
        .bind(&display_name)
        .bind(&password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if e.to_string().contains("unique") || e.to_string().contains("duplicate") {
                Status::already_exists("An account with this email already exists")
            } else {
                Status::internal(format!("Failed to create user: {}", e))
            }
        })?;

        let (org_id,): (String,) = sqlx::query_as(
            "INSERT INTO organizations (name, slug) VALUES ($1, $2) RETURNING id::text",
        )
        .bind(&req.organization_name)
        .bind(&req.organization_slug)
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
             VALUES ($1::uuid, $2::uuid, 'owner', true)",
        )
        .bind(&user_id)
        .bind(&org_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| Status::internal(format!("Failed to create membership: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| Status::internal(format!("Transaction commit error: {}", e)))?;

        tracing::info!("Registered user {} with organization {}", req.email, org_id);
        record_audit(
            &self.pool,
            &org_id,
            &user_id,
            "auth.register",
            "user",
            &user_id,
            serde_json::json!({ "email": req.email }),
        )
        .await;

        let response = issue_session(
            &self.pool,
            &self.jwt_secret,
            &user_id,
            &org_id,
            &req.email,
            &user_agent,
        )
        .await?;
        Ok(Response::new(response))
    }

    async fn login(
        &self,
        request: Request<LoginRequest>,
    ) -> Result<Response<AuthResponse>, Status> {
        let user_agent = user_agent_from_request(&request);
        let req = request.into_inner();

        if req.email.is_empty() || req.password.is_empty() {
            return Err(Status::invalid_argument("email and password are required"));
        }

        let row: Option<(String, String, bool, Option<String>, Vec<String>)> = sqlx::query_as(
            "SELECT id::text, password_hash, totp_enabled, totp_secret, recovery_codes
             FROM users
             WHERE LOWER(email) = LOWER($1) AND deleted_at IS NULL",
        )
        .bind(&req.email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        let (user_id, password_hash, totp_enabled, totp_secret, recovery_codes) =
            row.ok_or_else(|| Status::unauthenticated("Invalid credentials"))?;

        verify_password(&req.password, &password_hash)?;

        if totp_enabled {
            if req.totp_code.is_empty() {
                return Err(Status::unauthenticated("Two-factor code required"));
            }
            let secret = totp_secret
                .ok_or_else(|| Status::internal("Two-factor enabled without a secret"))?;
            self.check_two_factor(&user_id, &secret, &recovery_codes, &req.totp_code)
                .await?;
        }

        let org_id: Option<String> = sqlx::query_scalar(
            "SELECT om.organization_id::text
             FROM organization_members om
             JOIN organizations o ON o.id = om.organization_id
             WHERE om.user_id = $1::uuid AND o.deleted_at IS NULL
             ORDER BY om.is_default DESC, om.created_at
             LIMIT 1",
        )
        .bind(&user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        let org_id = org_id.ok_or_else(|| Status::failed_precondition("User has no organization"))?;

        record_audit(
            &self.pool,
            &org_id,
            &user_id,
            "auth.login",
            "user",
            &user_id,
            serde_json::json!({}),
        )
        .await;

        let response = issue_session(
            &self.pool,
            &self.jwt_secret,
            &user_id,
            &org_id,
            &req.email,
            &user_agent,
        )
        .await?;
        Ok(Response::new(response))
    }

    async fn logout(&self, request: Request<Empty>) -> Result<Response<Empty>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;

        sqlx::query(
            "UPDATE sessions SET revoked_at = NOW()
             WHERE id = $1::uuid AND user_id = $2::uuid AND revoked_at IS NULL",
        )
        .bind(&auth_user.session_id)
        .bind(&auth_user.user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        Ok(Response::new(Empty {}))
    }

    async fn validate_token(
        &self,
        request: Request<ValidateTokenRequest>,
    ) -> Result<Response<ValidateTokenResponse>, Status> {
        let req = request.into_inner();

        let result = jsonwebtoken::decode::<Claims>(
            &req.token,
            &jsonwebtoken::DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &jsonwebtoken::Validation::default(),
        );

        match result {
            Ok(data) => Ok(Response::new(ValidateTokenResponse {
                valid: true,
                user_id: data.claims.sub,
                organization_id: data.claims.org,
                email: data.claims.email,
            })),
            Err(_) => Ok(Response::new(ValidateTokenResponse {
                valid: false,
                user_id: String::new(),
                organization_id: String::new(),
                email: String::new(),
            })),
        }
    }

    async fn switch_organization(
        &self,
        request: Request<SwitchOrganizationRequest>,
    ) -> Result<Response<AuthResponse>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;
        let user_agent = user_agent_from_request(&request);
        let req = request.into_inner();

        if req.organization_id.is_empty() {
            return Err(Status::invalid_argument("organization_id is required"));
        }

        let is_member: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM organization_members om
                JOIN organizations o ON o.id = om.organization_id
                WHERE om.user_id = $1::uuid AND om.organization_id = $2::uuid
                  AND o.deleted_at IS NULL)",
        )
        .bind(&auth_user.user_id)
        .bind(&req.organization_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        if !is_member {
            return Err(Status::permission_denied(
                "Not a member of the requested organization",
            ));
        }

        let email: String = sqlx::query_scalar("SELECT email FROM users WHERE id = $1::uuid")
            .bind(&auth_user.user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        // A token is bound to one session row, so switching issues a new
        // session rather than rewriting the current one.
        let response = issue_session(
            &self.pool,
            &self.jwt_secret,
            &auth_user.user_id,
            &req.organization_id,
            &email,
            &user_agent,
        )
        .await?;
        Ok(Response::new(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("my-garage").is_ok());
        assert!(validate_slug("a1").is_ok());
        assert!(validate_slug("A-Garage").is_err());
        assert!(validate_slug("-leading").is_err());
        assert!(validate_slug("x").is_err());
        assert!(validate_slug("").is_err());
    }

    #[test]
    fn test_sha256_hex() {
        // sha256("") well-known digest
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash).is_ok());
        assert!(verify_password("wrong", &hash).is_err());
    }
}
