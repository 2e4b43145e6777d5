use crate::config::ChainRegistry;
use alloy_primitives::{ChainId, U256};
use async_trait::async_trait;
use mark_rebalance_types::{AssetDescriptor, BalanceMap};
use std::collections::HashMap;
use tracing::warn;

/// Reads an owner's on-chain holdings of one asset.
///
/// One implementation per chain family is expected (EVM via JSON-RPC, etc); the orchestrator
/// only ever sees this trait. Amounts are returned in the asset's native decimals — conversion
/// to canonical units happens in [`BalanceOracle::snapshot`], never inside an implementation.
#[async_trait]
#[auto_impl::auto_impl(&, &mut, Arc, Box)]
pub trait ChainBalanceProvider: std::fmt::Debug + Send + Sync {
    /// Reads `owner`'s native-decimal balance of `asset` on `asset.chain_id`.
    async fn read_balance(&self, owner: alloy_primitives::Address, asset: &AssetDescriptor) -> Result<U256, BalanceReadError>;
}

/// A balance read failed. Always non-fatal to the tick: the oracle folds this to zero.
#[derive(Debug, thiserror::Error)]
#[error("balance read failed for chain {chain_id}: {source}")]
pub struct BalanceReadError {
    pub chain_id: ChainId,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

/// Produces a consistent `tickerHash -> chainId -> amount18` snapshot once per tick.
#[derive(Debug)]
pub struct BalanceOracle<P> {
    provider: P,
    owner: alloy_primitives::Address,
}

impl<P: ChainBalanceProvider> BalanceOracle<P> {
    pub const fn new(provider: P, owner: alloy_primitives::Address) -> Self {
        Self { provider, owner }
    }

    /// Reads every configured asset across every chain in `registry` and folds the results
    /// into one [`BalanceMap`]. A read failure contributes zero and logs a warning; it never
    /// aborts the snapshot, since the read path is I/O bound and the tick is short-lived.
    pub async fn snapshot(&self, registry: &ChainRegistry) -> BalanceMap {
        let mut map = BalanceMap::new();
        let mut reads: HashMap<(ChainId, alloy_primitives::Address), ()> = HashMap::new();

        for chain_id in registry.chain_ids() {
            for asset in registry.assets(chain_id) {
                // Same (chain, address) can appear once; guards against a misconfigured
                // registry double-listing an asset.
                if reads.insert((chain_id, asset.address), ()).is_some() {
                    continue;
                }

                match self.provider.read_balance(self.owner, asset).await {
                    Ok(native) => {
                        match mark_rebalance_types::CanonicalAmount::from_native(native, asset.decimals) {
                            Ok(canonical) => map.add(asset.ticker_hash, chain_id, canonical),
                            Err(err) => {
                                warn!(
                                    target: "mark::balance_oracle",
                                    chain_id,
                                    symbol = %asset.symbol,
                                    %err,
                                    "dropping balance read, decimal conversion failed"
                                );
                            }
                        }
                    }
                    Err(err) => {
                        warn!(
                            target: "mark::balance_oracle",
                            chain_id,
                            symbol = %asset.symbol,
                            %err,
                            "balance read failed, treating as zero"
                        );
                        map.add(asset.ticker_hash, chain_id, mark_rebalance_types::CanonicalAmount::ZERO);
                    }
                }
            }
        }

        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChainConfig, ChainRegistry};
    use alloy_primitives::{Address, B256};
    use mark_rebalance_types::TickerHash;
    use mockall::mock;

    mock! {
        #[derive(Debug)]
        pub Provider {}

        #[async_trait]
        impl ChainBalanceProvider for Provider {
            async fn read_balance(&self, owner: Address, asset: &AssetDescriptor) -> Result<U256, BalanceReadError>;
        }
    }

    fn asset(ticker: TickerHash, chain_id: ChainId, address: Address) -> AssetDescriptor {
        AssetDescriptor {
            chain_id,
            address,
            symbol: "USDC".to_string(),
            decimals: 6,
            ticker_hash: ticker,
            is_native: false,
            balance_threshold: 0,
        }
    }

    #[tokio::test]
    async fn aggregates_assets_sharing_a_ticker_hash_across_chains() {
        let ticker = TickerHash::new(B256::repeat_byte(1));
        let registry = ChainRegistry::new(vec![
            ChainConfig {
                chain_id: 8453,
                provider_urls: vec![],
                assets: vec![asset(ticker, 8453, Address::with_last_byte(1))],
            },
            ChainConfig {
                chain_id: 10,
                provider_urls: vec![],
                assets: vec![asset(ticker, 10, Address::with_last_byte(2))],
            },
        ]);

        let mut provider = MockProvider::new();
        provider.expect_read_balance().returning(|_, _| Ok(U256::from(1_000_000u64)));

        let oracle = BalanceOracle::new(provider, Address::ZERO);
        let snapshot = oracle.snapshot(&registry).await;

        let expected = U256::from(1_000_000u64) * U256::from(10u64).pow(U256::from(12u64));
        assert_eq!(snapshot.get(ticker, 8453).unwrap().raw(), expected);
        assert_eq!(snapshot.get(ticker, 10).unwrap().raw(), expected);
    }

    #[tokio::test]
    async fn failed_read_contributes_zero_not_a_missing_entry() {
        let ticker = TickerHash::new(B256::repeat_byte(2));
        let registry = ChainRegistry::new(vec![ChainConfig {
            chain_id: 8453,
            provider_urls: vec![],
            assets: vec![asset(ticker, 8453, Address::with_last_byte(1))],
        }]);

        let mut provider = MockProvider::new();
        provider
            .expect_read_balance()
            .returning(|_, _| Err(BalanceReadError { chain_id: 8453, source: "rpc timeout".into() }));

        let oracle = BalanceOracle::new(provider, Address::ZERO);
        let snapshot = oracle.snapshot(&registry).await;

        assert_eq!(snapshot.get(ticker, 8453), Some(mark_rebalance_types::CanonicalAmount::ZERO));
    }
}
