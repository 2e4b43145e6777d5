use alloy_primitives::ChainId;
use mark_rebalance_storage::StorageError;
use mark_rebalance_types::{AmountConversionError, BridgeName, RoutePolicyError};
use thiserror::Error;

/// A single problem found while loading configuration at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A route names a bridge preference the registry has no adapter for.
    #[error("route {origin}->{destination} references unknown bridge {bridge}")]
    UnknownBridge { origin: ChainId, destination: ChainId, bridge: BridgeName },

    /// A route names an asset the chain registry doesn't describe.
    #[error("route {origin}->{destination} references unknown asset on chain {chain_id}")]
    UnknownAsset { origin: ChainId, destination: ChainId, chain_id: ChainId },

    /// A route references a chain with no configured `ChainService` provider.
    #[error("route {origin}->{destination} has no provider configured for chain {chain_id}")]
    MissingProvider { origin: ChainId, destination: ChainId, chain_id: ChainId },

    /// A route policy's own invariants don't hold.
    #[error("invalid route {origin}->{destination}: {source}")]
    InvalidRoute { origin: ChainId, destination: ChainId, #[source] source: RoutePolicyError },

    /// Every configuration problem found during startup validation, collected into one error
    /// so an operator sees the whole list instead of fixing issues one at a time.
    #[error("{} configuration problem(s) found: {}", .0.len(), join_errors(.0))]
    Aggregate(Vec<ConfigError>),
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Errors surfaced by the orchestrator tick loop.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Startup (or reload) configuration validation failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The operation store reported a failure. Fatal to the current tick; the next tick
    /// retries.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Decimal conversion between native and canonical units failed.
    #[error(transparent)]
    AmountConversion(#[from] AmountConversionError),
}
