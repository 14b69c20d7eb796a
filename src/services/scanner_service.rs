use std::collections::HashSet;

use sqlx::PgPool;
use tonic::{Request, Response, Status};

use crate::db::record_audit;
use crate::middleware::AuthenticatedUser;
use crate::proto::qr::scanner_service_server::ScannerService;
use crate::proto::qr::{
    OpKind, OperationResult, ResolveScanRequest, ResolveScanResponse, ScanOperation,
    SyncOperationsRequest, SyncOperationsResponse,
};

use super::bin_service::{active_short_code, bin_to_proto, fetch_bin, fetch_bin_contents};
use super::qr_service::resolve_short_code;

const MAX_SYNC_BATCH: usize = 500;

/// How one queued operation's id relates to the batch processed so far.
#[derive(Debug, PartialEq, Eq)]
enum QueueDisposition {
    /// No client_op_id; reject without touching the dedup set.
    MissingId,
    /// Already applied earlier in this batch; report ok, apply nothing.
    Duplicate,
    /// First occurrence; apply it.
    Fresh,
}

/// Classifies a queued operation against the ids already seen in this
/// batch. A replayed queue can contain duplicates; first occurrence wins.
fn classify_operation(seen: &mut HashSet<String>, client_op_id: &str) -> QueueDisposition {
    if client_op_id.is_empty() {
        return QueueDisposition::MissingId;
    }
    if seen.insert(client_op_id.to_string()) {
        QueueDisposition::Fresh
    } else {
        QueueDisposition::Duplicate
    }
}

pub struct ScannerServiceImpl {
    pool: PgPool,
}

impl ScannerServiceImpl {
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

    /// Applies one queued operation. Errors are reported per operation so
    /// one bad entry does not sink the rest of the queue.
    async fn apply_operation(
        &self,
        auth_user: &AuthenticatedUser,
        op: &ScanOperation,
    ) -> Result<(), String> {
        if op.bin_id.is_empty() || op.item_id.is_empty() {
            return Err("bin_id and item_id are required".to_string());
        }
        if op.quantity < 1 {
            return Err("quantity must be positive".to_string());
        }

        fetch_bin(&self.pool, &auth_user.org_id, &op.bin_id)
            .await
            .map_err(|s| s.message().to_string())?;

        let item_exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM items
                WHERE id = $1::uuid AND organization_id = $2::uuid AND deleted_at IS NULL)",
        )
        .bind(&op.item_id)
        .bind(&auth_user.org_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| format!("Database error: {}", e))?;
        if !item_exists {
            return Err("Item not found".to_string());
        }

        match op.kind() {
            OpKind::Add => {
                sqlx::query(
                    "INSERT INTO bin_items (bin_id, item_id, quantity)
                     VALUES ($1::uuid, $2::uuid, $3)
                     ON CONFLICT (bin_id, item_id) DO UPDATE
                         SET quantity = bin_items.quantity + EXCLUDED.quantity,
                             updated_at = NOW()",
                )
                .bind(&op.bin_id)
                .bind(&op.item_id)
                .bind(op.quantity)
                .execute(&self.pool)
                .await
                .map_err(|e| format!("Database error: {}", e))?;
                Ok(())
            }
            OpKind::Remove => {
                let current: Option<i32> = sqlx::query_scalar(
                    "SELECT quantity FROM bin_items WHERE bin_id = $1::uuid AND item_id = $2::uuid",
                )
                .bind(&op.bin_id)
                .bind(&op.item_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| format!("Database error: {}", e))?;

                let current = match current {
                    Some(q) => q,
                    None => return Err("Item is not in this bin".to_string()),
                };

                if op.quantity >= current {
                    sqlx::query(
                        "DELETE FROM bin_items WHERE bin_id = $1::uuid AND item_id = $2::uuid",
                    )
                    .bind(&op.bin_id)
                    .bind(&op.item_id)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| format!("Database error: {}", e))?;
                } else {
                    sqlx::query(
                        "UPDATE bin_items SET quantity = quantity - $1, updated_at = NOW()
                         WHERE bin_id = $2::uuid AND item_id = $3::uuid",
                    )
                    .bind(op.quantity)
                    .bind(&op.bin_id)
                    .bind(&op.item_id)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| format!("Database error: {}", e))?;
                }
                Ok(())
            }
            OpKind::Unspecified => Err("Unknown operation kind".to_string()),
        }
    }
}

#[tonic::async_trait]
impl ScannerService for ScannerServiceImpl {
    async fn resolve_scan(
        &self,
        request: Request<ResolveScanRequest>,
    ) -> Result<Response<ResolveScanResponse>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        if req.short_code.is_empty() {
            return Err(Status::invalid_argument("short_code is required"));
        }

        let bin_id = resolve_short_code(&self.pool, &auth_user.org_id, &req.short_code).await?;
        let bin = fetch_bin(&self.pool, &auth_user.org_id, &bin_id).await?;
        let short_code = active_short_code(&self.pool, &bin.id).await?;
        let items = fetch_bin_contents(&self.pool, &bin.id).await?;
        let item_count = items.len() as i32;

        record_audit(
            &self.pool,
            &auth_user.org_id,
            &auth_user.user_id,
            "scan.resolve",
            "bin",
            &bin.id,
            serde_json::json!({ "short_code": req.short_code }),
        )
        .await;

        Ok(Response::new(ResolveScanResponse {
            bin: Some(bin_to_proto(&bin, short_code, item_count)),
            items,
        }))
    }

    async fn sync_operations(
        &self,
        request: Request<SyncOperationsRequest>,
    ) -> Result<Response<SyncOperationsResponse>, Status> {
        let auth_user = Self::get_authenticated_user(&request)?;
        let req = request.into_inner();

        if req.operations.is_empty() {
            return Err(Status::invalid_argument("operations must not be empty"));
        }
        if req.operations.len() > MAX_SYNC_BATCH {
            return Err(Status::invalid_argument(format!(
                "Batch too large, at most {} operations per call",
                MAX_SYNC_BATCH
            )));
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut results = Vec::with_capacity(req.operations.len());
        let mut applied = 0;
        let mut failed = 0;

        for op in &req.operations {
            match classify_operation(&mut seen, &op.client_op_id) {
                QueueDisposition::MissingId => {
                    results.push(OperationResult {
                        client_op_id: String::new(),
                        ok: false,
                        error: "client_op_id is required".to_string(),
                    });
                    failed += 1;
                    continue;
                }
                QueueDisposition::Duplicate => {
                    results.push(OperationResult {
                        client_op_id: op.client_op_id.clone(),
                        ok: true,
                        error: String::new(),
                    });
                    continue;
                }
                QueueDisposition::Fresh => {}
            }

            match self.apply_operation(&auth_user, op).await {
                Ok(()) => {
                    applied += 1;
                    results.push(OperationResult {
                        client_op_id: op.client_op_id.clone(),
                        ok: true,
                        error: String::new(),
                    });
                }
                Err(message) => {
                    failed += 1;
                    results.push(OperationResult {
                        client_op_id: op.client_op_id.clone(),
                        ok: false,
                        error: message,
                    });
                }
            }
        }

        record_audit(
            &self.pool,
            &auth_user.org_id,
            &auth_user.user_id,
            "scan.sync",
            "organization",
            &auth_user.org_id,
            serde_json::json!({ "applied": applied, "failed": failed }),
        )
        .await;

        tracing::info!(
            "Scan queue sync for user {}: {} applied, {} failed",
            auth_user.user_id,
            applied,
            failed
        );

        Ok(Response::new(SyncOperationsResponse {
            results,
            applied,
            failed,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_occurrence_applies_then_duplicates_skip() {
        let mut seen = HashSet::new();
        assert_eq!(
            classify_operation(&mut seen, "op-1"),
            QueueDisposition::Fresh
        );
        assert_eq!(
            classify_operation(&mut seen, "op-1"),
            QueueDisposition::Duplicate
        );
        assert_eq!(
            classify_operation(&mut seen, "op-1"),
            QueueDisposition::Duplicate
        );
        assert_eq!(
            classify_operation(&mut seen, "op-2"),
            QueueDisposition::Fresh
        );
    }

    #[test]
    fn test_missing_id_never_enters_the_dedup_set() {
        let mut seen = HashSet::new();
        assert_eq!(
            classify_operation(&mut seen, ""),
            QueueDisposition::MissingId
        );
        // Repeated empty ids keep failing instead of deduplicating
        assert_eq!(
            classify_operation(&mut seen, ""),
            QueueDisposition::MissingId
        );
        assert!(seen.is_empty());
    }
}
