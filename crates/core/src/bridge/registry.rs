use super::{BridgeAdapter, BridgeError};
use mark_rebalance_types::BridgeName;
use std::collections::HashMap;
use std::sync::Arc;

/// Name-to-adapter mapping. No runtime subclassing or reflection: adapters are registered by
/// owned, type-erased trait objects at startup and never swapped out mid-process.
#[derive(Clone)]
pub struct BridgeRegistry {
    adapters: HashMap<BridgeName, Arc<dyn BridgeAdapter>>,
}

impl std::fmt::Debug for BridgeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeRegistry").field("adapters", &self.adapters.keys().collect::<Vec<_>>()).finish()
    }
}

impl BridgeRegistry {
    pub fn new() -> Self {
        Self { adapters: HashMap::new() }
    }

    /// Registers `adapter` under its own [`BridgeAdapter::name`].
    pub fn register(&mut self, adapter: Arc<dyn BridgeAdapter>) {
        self.adapters.insert(adapter.name(), adapter);
    }

    /// Looks up an adapter by name.
    pub fn get(&self, name: &BridgeName) -> Result<&Arc<dyn BridgeAdapter>, BridgeError> {
        self.adapters.get(name).ok_or_else(|| BridgeError::UnknownAdapter { bridge: name.clone() })
    }

    pub fn contains(&self, name: &BridgeName) -> bool {
        self.adapters.contains_key(name)
    }
}

impl Default for BridgeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
