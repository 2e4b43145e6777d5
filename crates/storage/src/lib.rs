//! Durable storage for earmarks, rebalance operations, the audit trail and pause state.
//!
//! Backed by Postgres via `sqlx`. Every mutating call that changes an entity's lifecycle
//! status commits an audit row in the same transaction — see [`store::OperationDb`].

mod error;
mod metrics;
mod models;
mod pagination;
mod store;
mod traits;

pub use error::StorageError;
pub use pagination::{EarmarkFilter, EarmarkLinkage, OperationFilter, Pagination};
pub use store::OperationDb;
pub use traits::{
    AuditLogReader, EarmarkStoreReader, EarmarkStoreWriter, OperationStoreReader, OperationStoreWriter, PauseRegistry,
};
