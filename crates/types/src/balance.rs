//! The balance snapshot produced once per tick by the balance oracle.

use crate::{CanonicalAmount, TickerHash};
use alloy_primitives::ChainId;
use std::collections::HashMap;

/// Two-level mapping `tickerHash -> chainId -> amount18`.
///
/// A single snapshot is read once per tick: subsequent per-route evaluations use that
/// snapshot even if wall-clock time advances during submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceMap {
    inner: HashMap<TickerHash, HashMap<ChainId, CanonicalAmount>>,
}

impl BalanceMap {
    /// An empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `amount` to the running total for `(ticker, chain)`, creating entries as needed.
    ///
    /// This is how multiple [`crate::AssetDescriptor`]s on the same chain (e.g. a bridged and
    /// a canonical representation of the same logical token) fold into one balance: assets
    /// sharing a `tickerHash` are aggregated by summing per chain.
    pub fn add(&mut self, ticker: TickerHash, chain: ChainId, amount: CanonicalAmount) {
        let by_chain = self.inner.entry(ticker).or_default();
        let entry = by_chain.entry(chain).or_insert(CanonicalAmount::ZERO);
        *entry = CanonicalAmount::from_canonical(entry.raw() + amount.raw());
    }

    /// Looks up the balance for `(ticker, chain)`. Absent entries are `None`, distinct from a
    /// recorded zero balance — callers that want "zero on failure to read" semantics should
    /// fold `None` to [`CanonicalAmount::ZERO`] explicitly at the call site, since an absent
    /// entry means "no balances" to the route evaluator, a distinct skip reason from a zero
    /// balance.
    pub fn get(&self, ticker: TickerHash, chain: ChainId) -> Option<CanonicalAmount> {
        self.inner.get(&ticker).and_then(|by_chain| by_chain.get(&chain)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{B256, U256};

    #[test]
    fn aggregates_same_ticker_same_chain() {
        let mut map = BalanceMap::new();
        let ticker = TickerHash::new(B256::repeat_byte(1));
        map.add(ticker, 1, CanonicalAmount::from_canonical(U256::from(10u64)));
        map.add(ticker, 1, CanonicalAmount::from_canonical(U256::from(5u64)));
        assert_eq!(map.get(ticker, 1).unwrap().raw(), U256::from(15u64));
    }

    #[test]
    fn missing_entry_is_none_not_zero() {
        let map = BalanceMap::new();
        let ticker = TickerHash::new(B256::repeat_byte(2));
        assert_eq!(map.get(ticker, 1), None);
    }
}
