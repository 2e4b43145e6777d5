use chrono::{DateTime, Utc};
use mark_rebalance_types::PauseKey;

use crate::error::StorageError;

/// Raw shape of a row in the `pauses` table.
#[derive(Debug, sqlx::FromRow)]
pub struct PauseRow {
    pub key: String,
    pub paused: bool,
    pub updated_at: DateTime<Utc>,
}

impl PauseRow {
    pub fn key(&self) -> Result<PauseKey, StorageError> {
        PauseKey::ALL
            .into_iter()
            .find(|k| k.as_str() == self.key)
            .ok_or_else(|| StorageError::InvalidStatus(self.key.clone()))
    }
}
