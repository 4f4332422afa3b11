use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

#[derive(Debug, Clone)]
pub struct AuditEntry<'a> {
    pub user_id: Option<Uuid>,
    pub action: &'a str,
    pub resource: Option<&'a str>,
    pub metadata: Option<Value>,
}

impl<'a> AuditEntry<'a> {
    pub fn new(user_id: Uuid, action: &'a str, resource: &'a str) -> Self {
        Self {
            user_id: Some(user_id),
            action,
            resource: Some(resource),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

pub async fn log_audit(pool: &DbPool, entry: &AuditEntry<'_>) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (id, user_id, action, resource, metadata)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(entry.user_id)
    .bind(entry.action)
    .bind(entry.resource)
    .bind(entry.metadata.clone())
    .execute(pool)
    .await?;

    Ok(())
}

/// Best-effort variant: the audit trail never fails the request.
pub async fn record(pool: &DbPool, entry: AuditEntry<'_>) {
    if let Err(err) = log_audit(pool, &entry).await {
        tracing::warn!(error = %err, action = entry.action, "audit log failed");
    }
}
