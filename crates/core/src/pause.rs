use mark_rebalance_storage::{PauseRegistry, StorageError};
use mark_rebalance_types::PauseKey;

/// Consults the pause registry at the points a tick is gated by it.
///
/// Only [`PauseKey::Rebalance`] is read by this engine: it suspends route evaluation (no new
/// operations are created) but never the callback engine, which keeps driving already-created
/// operations to completion regardless of the flag. [`PauseKey::Ondemand`] and
/// [`PauseKey::Purchase`] gate subsystems outside this crate and are exposed here only so the
/// admin surface can toggle all three through one registry.
#[derive(Debug)]
pub struct PauseGate<'a, R> {
    registry: &'a R,
}

impl<'a, R: PauseRegistry> PauseGate<'a, R> {
    pub const fn new(registry: &'a R) -> Self {
        Self { registry }
    }

    /// Whether route evaluation should run this tick.
    pub async fn route_evaluation_allowed(&self) -> Result<bool, StorageError> {
        Ok(!self.registry.is_paused(PauseKey::Rebalance).await?)
    }
}
