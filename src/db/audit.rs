use sqlx::PgPool;

/// Records an audit log entry. Best-effort: failures are logged and
/// swallowed so a full mutation never fails on audit bookkeeping.
pub async fn record_audit(
    pool: &PgPool,
    organization_id: &str,
    user_id: &str,
    action: &str,
    entity_type: &str,
    entity_id: &str,
    metadata: serde_json::Value,
) {
    let result = sqlx::query(
        "INSERT INTO audit_logs (organization_id, user_id, action, entity_type, entity_id, metadata)
         VALUES ($1::uuid, $2::uuid, $3, $4, $5, $6)",
    )
    .bind(organization_id)
    .bind(user_id)
    .bind(action)
    .bind(entity_type)
    .bind(entity_id)
    .bind(metadata)
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::warn!(
            "Failed to record audit log: action={}, entity={}/{}: {}",
            action,
            entity_type,
            entity_id,
            e
        );
    }
}
