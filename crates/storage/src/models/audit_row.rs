use chrono::{DateTime, Utc};
use mark_rebalance_types::{AuditAction, AuditLogEntry};
use uuid::Uuid;

use crate::error::StorageError;

/// Raw shape of a row in the append-only `earmark_audit_log` table.
#[derive(Debug, sqlx::FromRow)]
pub struct AuditLogRow {
    pub id: Uuid,
    pub entity_id: Uuid,
    pub action: String,
    pub prior_status: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl AuditLogRow {
    pub fn into_domain(self) -> Result<AuditLogEntry, StorageError> {
        let action = match self.action.as_str() {
            "EARMARK_STATUS_CHANGED" => AuditAction::EarmarkStatusChanged,
            "OPERATION_STATUS_CHANGED" => AuditAction::OperationStatusChanged,
            other => return Err(StorageError::InvalidStatus(other.to_owned())),
        };
        Ok(AuditLogEntry {
            id: self.id,
            entity_id: self.entity_id,
            action,
            prior_status: self.prior_status,
            reason: self.reason,
            created_at: self.created_at,
        })
    }
}

/// Database column value for an [`AuditAction`].
pub fn action_column(action: AuditAction) -> &'static str {
    match action {
        AuditAction::EarmarkStatusChanged => "EARMARK_STATUS_CHANGED",
        AuditAction::OperationStatusChanged => "OPERATION_STATUS_CHANGED",
    }
}
