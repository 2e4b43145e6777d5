mod registry;
pub use registry::{ChainConfig, ChainRegistry, ProviderConfig};

use crate::error::ConfigError;
use alloy_primitives::Address;
use derive_more::Constructor;
use mark_rebalance_types::{BridgeName, RoutePolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Top-level configuration for the rebalance orchestrator.
///
/// Loaded once at startup from a TOML file (optionally overridden by environment variables
/// via the CLI layer) and immutable for the process lifetime.
#[derive(Debug, Clone, Constructor)]
pub struct Config {
    /// Operation Store connection string.
    pub database_url: String,
    /// Maximum Postgres pool connections.
    pub max_connections: u32,
    /// Mark's own wallet address — both sender and recipient of every rebalance, since this
    /// engine moves the operator's own inventory between chains it controls.
    pub operator_address: Address,
    /// Per-chain asset catalog and RPC provider list.
    pub chain_registry: ChainRegistry,
    /// Static per-route rebalancing rules.
    pub routes: Vec<RoutePolicy>,
    /// Bridge adapter names a route is allowed to reference; the actual adapter instances are
    /// wired by the binary, this is only used to validate route preferences at startup.
    pub known_bridges: Vec<BridgeName>,
    /// How often the tick scheduler fires.
    pub tick_interval: Duration,
    /// Earmark/operation time-to-live before the sweeper expires them.
    pub expiry_ttl: Duration,
    /// Initial values for the three pause keys, applied only if the Pause Registry has no row
    /// yet for that key.
    pub pause_defaults: HashMap<mark_rebalance_types::PauseKey, bool>,
}

/// The subset of [`Config`] that is deserialized directly from TOML; the rest (pause defaults,
/// durations) is derived in [`FileConfig::into_config`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub database_url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    pub operator_address: Address,
    pub chains: Vec<ChainConfig>,
    pub routes: Vec<RoutePolicy>,
    #[serde(default)]
    pub known_bridges: Vec<BridgeName>,
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
    #[serde(default = "default_expiry_ttl_secs")]
    pub expiry_ttl_secs: u64,
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_tick_interval_secs() -> u64 {
    15
}

const fn default_expiry_ttl_secs() -> u64 {
    24 * 60 * 60
}

impl FileConfig {
    /// Parses a TOML document into a [`FileConfig`].
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Converts the file-shaped configuration into the runtime [`Config`], validating every
    /// route against the chain registry and the known bridge list and aggregating every
    /// problem found rather than failing on the first one.
    pub fn into_config(self) -> Result<Config, ConfigError> {
        let registry = ChainRegistry::new(self.chains);
        let mut problems = Vec::new();

        for route in &self.routes {
            if let Err(source) = route.validate() {
                problems.push(ConfigError::InvalidRoute { origin: route.origin, destination: route.destination, source });
            }
            if registry.asset(route.origin, route.ticker_hash).is_none() {
                problems.push(ConfigError::UnknownAsset {
                    origin: route.origin,
                    destination: route.destination,
                    chain_id: route.origin,
                });
            }
            if registry.asset(route.destination, route.ticker_hash).is_none() {
                problems.push(ConfigError::UnknownAsset {
                    origin: route.origin,
                    destination: route.destination,
                    chain_id: route.destination,
                });
            }
            if registry.provider(route.origin).is_none() {
                problems.push(ConfigError::MissingProvider {
                    origin: route.origin,
                    destination: route.destination,
                    chain_id: route.origin,
                });
            }
            if registry.provider(route.destination).is_none() {
                problems.push(ConfigError::MissingProvider {
                    origin: route.origin,
                    destination: route.destination,
                    chain_id: route.destination,
                });
            }
            for bridge in &route.preferences {
                if !self.known_bridges.contains(bridge) {
                    problems.push(ConfigError::UnknownBridge {
                        origin: route.origin,
                        destination: route.destination,
                        bridge: bridge.clone(),
                    });
                }
            }
        }

        if !problems.is_empty() {
            return Err(ConfigError::Aggregate(problems));
        }

        Ok(Config {
            database_url: self.database_url,
            max_connections: self.max_connections,
            operator_address: self.operator_address,
            chain_registry: registry,
            routes: self.routes,
            known_bridges: self.known_bridges,
            tick_interval: Duration::from_secs(self.tick_interval_secs),
            expiry_ttl: Duration::from_secs(self.expiry_ttl_secs),
            pause_defaults: HashMap::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        database_url = "postgres://localhost/mark"
        operator_address = "0x00000000000000000000000000000000000009"
        known_bridges = ["across"]

        [[chains]]
        chain_id = 8453
        provider_urls = ["https://base.example"]

          [[chains.assets]]
          address = "0x0000000000000000000000000000000000000001"
          symbol = "USDC"
          decimals = 6
          ticker_hash = "0x1111111111111111111111111111111111111111111111111111111111111b"
          is_native = false
          balance_threshold = 0

        [[chains]]
        chain_id = 10
        provider_urls = ["https://op.example"]

          [[chains.assets]]
          address = "0x0000000000000000000000000000000000000002"
          symbol = "USDC"
          decimals = 6
          ticker_hash = "0x1111111111111111111111111111111111111111111111111111111111111b"
          is_native = false
          balance_threshold = 0

        [[routes]]
        origin = 8453
        destination = 10
        asset = "0x0000000000000000000000000000000000000001"
        ticker_hash = "0x1111111111111111111111111111111111111111111111111111111111111b"
        maximum = "1000000000000000000000"
        preferences = ["across"]
        slippages = [50]
    "#;

    #[test]
    fn parses_and_validates_a_well_formed_config() {
        let file = FileConfig::from_toml_str(SAMPLE).unwrap();
        let config = file.into_config().unwrap();
        assert_eq!(config.routes.len(), 1);
    }

    #[test]
    fn aggregates_unknown_bridge_and_missing_provider() {
        let mut file = FileConfig::from_toml_str(SAMPLE).unwrap();
        file.known_bridges.clear();
        file.chains.truncate(1);
        let err = file.into_config().unwrap_err();
        match err {
            ConfigError::Aggregate(problems) => assert!(problems.len() >= 2),
            other => panic!("expected aggregate error, got {other:?}"),
        }
    }
}
