use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which kind of entity an [`AuditLogEntry`] records a mutation of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    EarmarkStatusChanged,
    OperationStatusChanged,
}

/// An append-only row recording one status mutation of an earmark or operation.
///
/// Written in the same transaction as the mutation it records: every state transition is
/// committed by the operation store alongside the audit row for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    /// The earmark or operation id this entry is about.
    pub entity_id: Uuid,
    pub action: AuditAction,
    /// The status the entity held immediately before this mutation.
    pub prior_status: String,
    /// Free-form explanation, e.g. "readyOnDestination returned true".
    pub reason: String,
    pub created_at: DateTime<Utc>,
}
