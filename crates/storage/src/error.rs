use thiserror::Error;
use uuid::Uuid;

/// Errors that may occur while interacting with the operation store.
///
/// Used across every trait implemented by [`crate::OperationDb`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying connection pool or query failed.
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// Running the embedded migrations against a fresh pool failed.
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The requested entity does not exist.
    #[error("entity not found: {0}")]
    NotFound(Uuid),

    /// An `invoice_id` that already exists was used to create a new earmark.
    #[error("invoice id already in use: {0}")]
    DuplicateInvoiceId(String),

    /// A row's `status` column held a string this build doesn't recognise.
    #[error("unrecognised status column value: {0}")]
    InvalidStatus(String),

    /// A transition was requested that the lifecycle state machine forbids.
    #[error("illegal status transition for {entity_id}: {from} -> {to}")]
    IllegalTransition {
        /// The entity the caller tried to transition.
        entity_id: Uuid,
        /// Its status before the attempted write.
        from: String,
        /// The status the caller asked for.
        to: String,
    },

    /// A pagination request fell outside the bounds the store enforces.
    #[error("pagination limit must be in 1..=1000, got {0}")]
    InvalidLimit(i64),
}

impl PartialEq for StorageError {
    fn eq(&self, other: &Self) -> bool {
        use StorageError::*;
        match (self, other) {
            (Database(a), Database(b)) => a.to_string() == b.to_string(),
            (Migration(a), Migration(b)) => a.to_string() == b.to_string(),
            (NotFound(a), NotFound(b)) => a == b,
            (DuplicateInvoiceId(a), DuplicateInvoiceId(b)) => a == b,
            (InvalidStatus(a), InvalidStatus(b)) => a == b,
            (
                IllegalTransition { entity_id: e1, from: f1, to: t1 },
                IllegalTransition { entity_id: e2, from: f2, to: t2 },
            ) => e1 == e2 && f1 == f2 && t1 == t2,
            (InvalidLimit(a), InvalidLimit(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for StorageError {}
