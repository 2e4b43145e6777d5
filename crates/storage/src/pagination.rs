use alloy_primitives::ChainId;
use mark_rebalance_types::{EarmarkStatus, OperationStatus};
use uuid::Uuid;

use crate::error::StorageError;

/// `limit`/`offset` pagination, bounded to keep listing queries cheap.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    pub const MAX_LIMIT: i64 = 1000;

    pub fn new(limit: i64, offset: i64) -> Result<Self, StorageError> {
        if limit < 1 || limit > Self::MAX_LIMIT {
            return Err(StorageError::InvalidLimit(limit));
        }
        Ok(Self { limit, offset: offset.max(0) })
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self { limit: 100, offset: 0 }
    }
}

/// Whether a listing query should restrict to standalone operations, earmark-linked ones, or
/// either.
#[derive(Debug, Clone, Copy, Default)]
pub enum EarmarkLinkage {
    #[default]
    Any,
    Standalone,
    LinkedTo(Uuid),
}

/// Filters accepted by [`crate::traits::OperationStoreReader::list_operations`].
#[derive(Debug, Clone, Default)]
pub struct OperationFilter {
    pub status: Option<OperationStatus>,
    pub chain_id: Option<ChainId>,
    pub earmark: EarmarkLinkage,
}

/// Filters accepted by [`crate::traits::EarmarkStoreReader::list_earmarks`].
#[derive(Debug, Clone, Default)]
pub struct EarmarkFilter {
    pub status: Option<EarmarkStatus>,
}
