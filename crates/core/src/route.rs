use alloy_primitives::{ChainId, U256};
use mark_rebalance_types::{AmountConversionError, BalanceMap, BridgeName, CanonicalAmount, RoutePolicy, TickerHash};

/// Why a route was skipped this tick. Not an error — these are the expected, common outcomes
/// of evaluating a route against current balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No balance snapshot entry exists for this route's `(tickerHash, origin)`.
    NoBalances,
    /// `current <= maximum`; nothing to rebalance.
    AtOrBelowMaximum,
    /// `current - reserve <= 0`; the reserve floor consumes all available inventory.
    ReserveConsumesAllInventory,
}

/// A route that is warranted a transfer this tick, with the native-unit amount to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecision {
    pub origin: ChainId,
    pub destination: ChainId,
    pub ticker_hash: TickerHash,
    /// Amount to hand to the adapter, in the origin asset's native decimals.
    pub native_amount: U256,
    /// Same amount, canonical units — what gets persisted on the operation row (subject to
    /// `effectiveAmount` override during adapter selection).
    pub canonical_amount: CanonicalAmount,
    pub preferences: Vec<BridgeName>,
    pub slippages: Vec<u32>,
}

/// Decides, for one route, whether a transfer is warranted and at what amount.
///
/// Pure function over a balance snapshot and a route policy; never talks to the network. The
/// origin asset's native decimals must be looked up by the caller (the chain registry), since
/// this function is agnostic to where the registry lives.
pub fn evaluate_route(
    route: &RoutePolicy,
    balances: &BalanceMap,
    origin_decimals: u8,
) -> Result<RouteDecision, SkipReason> {
    let current = balances.get(route.ticker_hash, route.origin).ok_or(SkipReason::NoBalances)?;

    if current <= route.maximum {
        return Err(SkipReason::AtOrBelowMaximum);
    }

    let reserve = route.reserve.unwrap_or(CanonicalAmount::ZERO);
    let amount_to_bridge = current.checked_sub(reserve).ok_or(SkipReason::ReserveConsumesAllInventory)?;
    if amount_to_bridge.is_zero() {
        return Err(SkipReason::ReserveConsumesAllInventory);
    }

    let native_amount = amount_to_bridge
        .to_native(origin_decimals)
        .map_err(|_: AmountConversionError| SkipReason::ReserveConsumesAllInventory)?;

    Ok(RouteDecision {
        origin: route.origin,
        destination: route.destination,
        ticker_hash: route.ticker_hash,
        native_amount,
        canonical_amount: amount_to_bridge,
        preferences: route.preferences.clone(),
        slippages: route.slippages.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B256};

    fn route(maximum: u64, reserve: Option<u64>) -> RoutePolicy {
        RoutePolicy {
            origin: 8453,
            destination: 10,
            asset: Address::ZERO,
            ticker_hash: TickerHash::new(B256::repeat_byte(1)),
            maximum: CanonicalAmount::from_canonical(U256::from(maximum)),
            reserve: reserve.map(|r| CanonicalAmount::from_canonical(U256::from(r))),
            preferences: vec![BridgeName::Across],
            slippages: vec![50],
        }
    }

    #[test]
    fn missing_balance_entry_skips_with_no_balances() {
        let route = route(100, None);
        let balances = BalanceMap::new();
        assert_eq!(evaluate_route(&route, &balances, 18), Err(SkipReason::NoBalances));
    }

    #[test]
    fn current_equal_to_maximum_skips() {
        let route = route(100, None);
        let mut balances = BalanceMap::new();
        balances.add(route.ticker_hash, route.origin, CanonicalAmount::from_canonical(U256::from(100u64)));
        assert_eq!(evaluate_route(&route, &balances, 18), Err(SkipReason::AtOrBelowMaximum));
    }

    #[test]
    fn reserve_consuming_all_inventory_skips() {
        let route = route(100, Some(150));
        let mut balances = BalanceMap::new();
        balances.add(route.ticker_hash, route.origin, CanonicalAmount::from_canonical(U256::from(150u64)));
        assert_eq!(evaluate_route(&route, &balances, 18), Err(SkipReason::ReserveConsumesAllInventory));
    }

    #[test]
    fn decimals_18_native_amount_equals_canonical() {
        let route = route(100, None);
        let mut balances = BalanceMap::new();
        balances.add(route.ticker_hash, route.origin, CanonicalAmount::from_canonical(U256::from(120u64)));
        let decision = evaluate_route(&route, &balances, 18).unwrap();
        assert_eq!(decision.native_amount, U256::from(20u64));
    }

    #[test]
    fn decimals_6_reserve_leaves_nonclean_remainder() {
        let route = RoutePolicy {
            maximum: CanonicalAmount::from_native(U256::from(40_000_000u64), 6).unwrap(),
            reserve: Some(CanonicalAmount::from_native(U256::from(47_000_000u64), 6).unwrap()),
            ..route(0, None)
        };
        let mut balances = BalanceMap::new();
        balances.add(
            route.ticker_hash,
            route.origin,
            CanonicalAmount::from_native(U256::from(48_796_999u64), 6).unwrap(),
        );
        let decision = evaluate_route(&route, &balances, 6).unwrap();
        assert_eq!(decision.native_amount, U256::from(1_796_999u64));
    }
}
