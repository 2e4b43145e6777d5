use crate::{BridgeName, CanonicalAmount, TickerHash};
use alloy_primitives::{Address, ChainId};
use serde::{Deserialize, Serialize};

/// Immutable per-(origin, destination, asset) rebalancing rule.
///
/// Route policies are read-only for the lifetime of the process. They are validated once at
/// load time via [`RoutePolicy::validate`]; a policy that fails validation is a configuration
/// error and must be rejected before the first tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePolicy {
    /// Origin chain this policy rebalances inventory away from.
    pub origin: ChainId,
    /// Destination chain inventory is rebalanced to.
    pub destination: ChainId,
    /// Canonical asset address on `origin`.
    pub asset: Address,
    /// Cross-chain identity of `asset`.
    pub ticker_hash: TickerHash,
    /// Upper bound on desired inventory on `origin`, canonical units.
    pub maximum: CanonicalAmount,
    /// Minimum amount to retain on `origin` after any transfer, canonical units.
    pub reserve: Option<CanonicalAmount>,
    /// Ordered bridge preferences, tried in order by the adapter selection loop.
    pub preferences: Vec<BridgeName>,
    /// Slippage tolerance (basis points) paired positionally with `preferences`.
    pub slippages: Vec<u32>,
}

/// A [`RoutePolicy`] that violates one of its structural invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RoutePolicyError {
    /// `len(slippages) != len(preferences)`.
    #[error("route has {preferences} preferences but {slippages} slippage entries")]
    PreferenceSlippageLengthMismatch { preferences: usize, slippages: usize },

    /// A route declared no bridge preferences at all.
    #[error("route has no bridge preferences")]
    EmptyPreferences,

    /// `reserve >= maximum` when both are set.
    #[error("reserve must be strictly less than maximum when both are set")]
    ReserveNotLessThanMaximum,
}

impl RoutePolicy {
    /// Validates the structural invariants a route policy must hold.
    ///
    /// This does not validate that `asset`/bridge names resolve to anything live — that cross
    /// checks against the chain registry and bridge adapter registry, which happens during
    /// startup aggregation of configuration errors.
    pub fn validate(&self) -> Result<(), RoutePolicyError> {
        if self.preferences.is_empty() {
            return Err(RoutePolicyError::EmptyPreferences);
        }
        if self.preferences.len() != self.slippages.len() {
            return Err(RoutePolicyError::PreferenceSlippageLengthMismatch {
                preferences: self.preferences.len(),
                slippages: self.slippages.len(),
            });
        }
        if let Some(reserve) = self.reserve {
            if reserve >= self.maximum {
                return Err(RoutePolicyError::ReserveNotLessThanMaximum);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B256, U256};

    fn base_route() -> RoutePolicy {
        RoutePolicy {
            origin: 1,
            destination: 10,
            asset: Address::ZERO,
            ticker_hash: TickerHash::new(B256::ZERO),
            maximum: CanonicalAmount::from_canonical(U256::from(100u64)),
            reserve: None,
            preferences: vec![BridgeName::Across],
            slippages: vec![50],
        }
    }

    #[test]
    fn valid_route_passes() {
        assert!(base_route().validate().is_ok());
    }

    #[test]
    fn mismatched_lengths_rejected() {
        let mut route = base_route();
        route.slippages.push(25);
        assert_eq!(
            route.validate().unwrap_err(),
            RoutePolicyError::PreferenceSlippageLengthMismatch { preferences: 1, slippages: 2 }
        );
    }

    #[test]
    fn empty_preferences_rejected() {
        let mut route = base_route();
        route.preferences.clear();
        route.slippages.clear();
        assert_eq!(route.validate().unwrap_err(), RoutePolicyError::EmptyPreferences);
    }

    #[test]
    fn reserve_equal_to_maximum_rejected() {
        let mut route = base_route();
        route.reserve = Some(route.maximum);
        assert_eq!(route.validate().unwrap_err(), RoutePolicyError::ReserveNotLessThanMaximum);
    }
}
