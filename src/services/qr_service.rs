use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tonic::{Request, Response, Status};
use uuid::Uuid;

use crate::db::record_audit;
use crate::middleware::AuthenticatedUser;
use crate::models::QrCodeModel;
use crate::proto::common::Empty;
use crate::proto::qr::qr_service_server::QrService;
use crate::proto::qr::{
    GenerateQrCodeRequest, QrCodeResponse, ResolveQrCodeRequest, ResolveQrCodeResponse,
    RevokeQrCodeRequest,
};
use crate::shortlink;

use super::bin_service::{active_short_code, bin_to_proto, fetch_bin, fetch_bin_contents};

/// Generating a short code can collide with an existing row. Retries are
/// cheap, collisions on 48 random bits are not expected in practice.
const SHORT_CODE_ATTEMPTS: usize = 3;

/// The checksum payload must use the canonical lowercase UUID form the
/// database returns at resolve time, whatever casing the caller sent.
fn canonical_bin_id(bin_id: &str) -> Result<String, Status> {
    bin_id
        .parse::<Uuid>()
        .map(|id| id.to_string())
        .map_err(|_| Status::invalid_argument("bin_id must be a UUID"))
}

pub(crate) struct IssuedQrCode {
    pub short_code: String,
    pub checksum: String,
    pub scan_url: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Issues a fresh QR code for a bin, revoking any active one first so a
/// short code maps to at most one live bin record.
pub(crate) async fn issue_for_bin(
    pool: &PgPool,
    org_id: &str,
    bin_id: &str,
    base_url: &str,
    expires_at: Option<DateTime<Utc>>,
) -> Result<IssuedQrCode, Status> {
    let bin_id = canonical_bin_id(bin_id)?;
    let issued_at = Utc::now();

    // One transaction per attempt: a unique violation aborts the whole
    // transaction, so a retry cannot reuse it.
    for attempt in 0..SHORT_CODE_ATTEMPTS {
        let short_code = shortlink::generate_short_code().map_err(Status::from)?;
        let checksum = shortlink::checksum(&bin_id, &short_code, issued_at);

        let mut tx = pool
            .begin()
            .await
            .map_err(|e| Status::internal(format!("Transaction error: {}", e)))?;

        sqlx::query(
            "UPDATE qr_codes SET revoked_at = NOW() WHERE bin_id = $1::uuid AND revoked_at IS NULL",
        )
        .bind(&bin_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        let inserted = sqlx::query(
            "INSERT INTO qr_codes (organization_id, bin_id, short_code, checksum, issued_at, expires_at)
             VALUES ($1::uuid, $2::uuid, $3, $4, $5, $6)",
        )
        .bind(org_id)
        .bind(&bin_id)
        .bind(&short_code)
        .bind(&checksum)
        .bind(issued_at)
        .bind(expires_at)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {
                tx.commit()
                    .await
                    .map_err(|e| Status::internal(format!("Transaction commit error: {}", e)))?;
                return Ok(IssuedQrCode {
                    scan_url: shortlink::scan_url(base_url, &short_code),
                    short_code,
                    checksum,
                    issued_at,
                    expires_at,
                });
            }
            Err(e) if e.to_string().contains("unique") || e.to_string().contains("duplicate") => {
                tracing::warn!(
                    "Short code collision on attempt {}, retrying: {}",
                    attempt + 1,
                    short_code
                );
            }
            Err(e) => return Err(Status::internal(format!("Database error: {}", e))),
        }
    }

    Err(Status::internal("Short code generation failed"))
}

/// Looks up a live short code in the caller's organization and validates
/// the stored record, returning the bin id it points at.
pub(crate) async fn resolve_short_code(
    pool: &PgPool,
    org_id: &str,
    short_code: &str,
) -> Result<String, Status> {
    let qr: QrCodeModel = sqlx::query_as(
        "SELECT id::text, organization_id::text, bin_id::text, short_code, checksum,
                issued_at, expires_at
         FROM qr_codes
         WHERE short_code = $1 AND organization_id = $2::uuid AND revoked_at IS NULL",
    )
    .bind(short_code)
    .bind(org_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| Status::internal(format!("Database error: {}", e)))?
    .ok_or_else(|| Status::not_found("QR code not found"))?;

    shortlink::validate(
        &qr.bin_id,
        &qr.short_code,
        &qr.checksum,
        qr.issued_at,
        qr.expires_at,
        Utc::now(),
    )
    .map_err(Status::from)?;

    Ok(qr.bin_id)
}

pub struct QrServiceImpl {
    pool: PgPool,
    qr_base_url: String,
}

impl QrServiceImpl {
    pub fn new(pool: PgPool, qr_base_url: String) -> Self {
        Self { pool, qr_base_url }
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
impl QrService for QrServiceImpl {
    async fn generate_qr_code(
        &self,
        request: Request<GenerateQrCodeRequest>,
    ) -> Result<Response<QrCodeResponse>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        if req.bin_id.is_empty() {
            return Err(Status::invalid_argument("bin_id is required"));
        }
        if req.expires_in_hours < 0 {
            return Err(Status::invalid_argument("expires_in_hours must not be negative"));
        }

        fetch_bin(&self.pool, &auth_user.org_id, &req.bin_id).await?;

        let expires_at = if req.expires_in_hours > 0 {
            Some(Utc::now() + Duration::hours(req.expires_in_hours as i64))
        } else {
            None
        };

        let issued = issue_for_bin(
            &self.pool,
            &auth_user.org_id,
            &req.bin_id,
            &self.qr_base_url,
            expires_at,
        )
        .await?;

        record_audit(
            &self.pool,
            &auth_user.org_id,
            &auth_user.user_id,
            "qr.generate",
            "bin",
            &req.bin_id,
            serde_json::json!({ "short_code": issued.short_code }),
        )
        .await;

        Ok(Response::new(QrCodeResponse {
            short_code: issued.short_code,
            checksum: issued.checksum,
            scan_url: issued.scan_url,
            issued_at: issued.issued_at.to_rfc3339(),
            expires_at: issued
                .expires_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
        }))
    }

    async fn resolve_qr_code(
        &self,
        request: Request<ResolveQrCodeRequest>,
    ) -> Result<Response<ResolveQrCodeResponse>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        if req.short_code.is_empty() {
            return Err(Status::invalid_argument("short_code is required"));
        }

        let bin_id = resolve_short_code(&self.pool, &auth_user.org_id, &req.short_code).await?;
        let bin = fetch_bin(&self.pool, &auth_user.org_id, &bin_id).await?;
        let short_code = active_short_code(&self.pool, &bin.id).await?;
        let items = fetch_bin_contents(&self.pool, &bin.id).await?;

        Ok(Response::new(ResolveQrCodeResponse {
            bin: Some(bin_to_proto(&bin, short_code, items.len() as i32)),
        }))
    }

    async fn revoke_qr_code(
        &self,
        request: Request<RevokeQrCodeRequest>,
    ) -> Result<Response<Empty>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        if req.short_code.is_empty() {
            return Err(Status::invalid_argument("short_code is required"));
        }

        let result = sqlx::query(
            "UPDATE qr_codes SET revoked_at = NOW()
             WHERE short_code = $1 AND organization_id = $2::uuid AND revoked_at IS NULL",
        )
        .bind(&req.short_code)
        .bind(&auth_user.org_id)
        .execute(&self.pool)
        .await
        .map_err(|e| Status::internal(format!("Database error: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(Status::not_found("QR code not found"));
        }

        record_audit(
            &self.pool,
            &auth_user.org_id,
            &auth_user.user_id,
            "qr.revoke",
            "qr_code",
            &req.short_code,
            serde_json::json!({}),
        )
        .await;

        Ok(Response::new(Empty {}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tonic::Code;

    #[test]
    fn test_canonical_bin_id_lowercases() {
        let id = canonical_bin_id("A7F3C2D1-0B4E-4F6A-9C8D-1E2F3A4B5C6D").unwrap();
        assert_eq!(id, "a7f3c2d1-0b4e-4f6a-9c8d-1e2f3a4b5c6d");
    }

    #[test]
    fn test_canonical_bin_id_rejects_garbage() {
        let err = canonical_bin_id("not-a-uuid").unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
    }

    #[test]
    fn test_checksum_over_canonical_id_validates_against_stored_row() {
        // The database hands back lowercase ids at resolve time, so a code
        // issued with an uppercase-cased id must checksum identically.
        let issued_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let canonical = canonical_bin_id("A7F3C2D1-0B4E-4F6A-9C8D-1E2F3A4B5C6D").unwrap();
        let sum = shortlink::checksum(&canonical, "AbCd12xY", issued_at);
        assert!(shortlink::validate(
            "a7f3c2d1-0b4e-4f6a-9c8d-1e2f3a4b5c6d",
            "AbCd12xY",
            &sum,
            issued_at,
            None,
            Utc::now(),
        )
        .is_ok());
    }
}
