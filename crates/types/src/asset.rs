use alloy_primitives::{Address, B256, ChainId};
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// The cross-chain identity of a fungible asset.
///
/// Per the glossary: "equal for the same logical token across chains." Two [`AssetDescriptor`]
/// entries on different chains with the same [`TickerHash`] are aggregated together by the
/// [`crate::balance::BalanceMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Serialize, Deserialize)]
#[display("{_0}")]
pub struct TickerHash(B256);

impl TickerHash {
    /// Wraps a raw 32-byte hash as a [`TickerHash`].
    pub const fn new(hash: B256) -> Self {
        Self(hash)
    }

    /// Returns the underlying hash.
    pub const fn as_b256(self) -> B256 {
        self.0
    }
}

/// Static, per-chain description of a single asset the engine tracks.
///
/// Read-only at runtime; loaded once from the chain registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    /// Chain this descriptor applies to.
    pub chain_id: ChainId,
    /// On-chain contract address; meaningless when `is_native` is set, but still populated
    /// with the chain's canonical placeholder so downstream lookups never need an `Option`.
    pub address: Address,
    /// Human-readable ticker, e.g. `"USDC"`.
    pub symbol: String,
    /// Native decimal precision of this asset on `chain_id`.
    pub decimals: u8,
    /// Cross-chain identity; shared by every [`AssetDescriptor`] representing the same logical
    /// token on different chains.
    pub ticker_hash: TickerHash,
    /// Whether balances of this asset are read via the chain's native-coin balance query
    /// rather than an ERC-20-equivalent `balanceOf` call.
    pub is_native: bool,
    /// Below this native-unit threshold, a balance read is treated as dust and skipped by the
    /// balance oracle warning path rather than triggering a route evaluation.
    pub balance_threshold: u128,
}
