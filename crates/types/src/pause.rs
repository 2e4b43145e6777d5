use serde::{Deserialize, Serialize};

/// One of the three fixed pause keys the orchestrator recognizes. No others are defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PauseKey {
    /// Gates issuance of new rebalance operations (route evaluation).
    Rebalance,
    /// Gates on-demand (invoice-driven) inventory top-ups.
    Ondemand,
    /// Gates the invoice/intent purchase subsystem (external to this engine).
    Purchase,
}

impl PauseKey {
    /// All pause keys, in a stable order — useful for seeding/reporting defaults.
    pub const ALL: [Self; 3] = [Self::Rebalance, Self::Ondemand, Self::Purchase];

    /// The database column value for this key.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rebalance => "rebalance",
            Self::Ondemand => "ondemand",
            Self::Purchase => "purchase",
        }
    }
}

impl std::fmt::Display for PauseKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
