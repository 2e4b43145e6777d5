use alloy_primitives::ChainId;
use mark_rebalance_types::{AssetDescriptor, TickerHash};
use serde::{Deserialize, Serialize};

/// RPC provider configuration for a single chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Ordered list of RPC endpoints; the first reachable one is used.
    pub provider_urls: Vec<String>,
}

/// One chain's asset catalog and provider list, as loaded from the chain registry section of
/// the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: ChainId,
    pub provider_urls: Vec<String>,
    pub assets: Vec<AssetDescriptor>,
}

/// Read-only, per-chain asset catalog and RPC provider list.
///
/// Parsed once at startup; every lookup is a cheap in-memory scan over a handful of chains,
/// so no index structure beyond a `Vec` is warranted.
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    chains: Vec<ChainConfig>,
}

impl ChainRegistry {
    pub const fn new(chains: Vec<ChainConfig>) -> Self {
        Self { chains }
    }

    /// All configured chain ids.
    pub fn chain_ids(&self) -> impl Iterator<Item = ChainId> + '_ {
        self.chains.iter().map(|c| c.chain_id)
    }

    /// Every asset descriptor configured for `chain_id`.
    pub fn assets(&self, chain_id: ChainId) -> impl Iterator<Item = &AssetDescriptor> {
        self.chains.iter().filter(move |c| c.chain_id == chain_id).flat_map(|c| c.assets.iter())
    }

    /// The asset descriptor for `ticker_hash` on `chain_id`, if the registry describes one.
    pub fn asset(&self, chain_id: ChainId, ticker_hash: TickerHash) -> Option<&AssetDescriptor> {
        self.assets(chain_id).find(|a| a.ticker_hash == ticker_hash)
    }

    /// The configured provider endpoints for `chain_id`, if any.
    pub fn provider(&self, chain_id: ChainId) -> Option<&[String]> {
        self.chains.iter().find(|c| c.chain_id == chain_id).map(|c| c.provider_urls.as_slice())
    }
}
