//! Typed errors that callers branch on. Everything else travels as an [anyhow::Error].

use balin_primitives::{Claim, GameType};
use thiserror::Error;

/// A [ConfigError] is raised by [crate::DriverConfig::check] before anything is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("max concurrency must be at least 1")]
    ZeroConcurrency,
    #[error("poll interval must be non-zero")]
    ZeroPollInterval,
    #[error("tick deadline must be non-zero")]
    ZeroTickDeadline,
    #[error("at least one trace type must be enabled")]
    NoTraceTypes,
    #[error("the cannon trace type requires a cannon executable")]
    MissingCannonBin,
    #[error("transactions need at least one submission attempt")]
    ZeroTxAttempts,
    #[error("unknown trace type `{0}`")]
    UnknownTraceType(String),
}

/// A [RegistryError] is raised while wiring up the [crate::GameTypeRegistry] at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("game type {0} is already registered")]
    DuplicateGameType(GameType),
}

/// A [ValidationError] means that a game's fixed parameters disagree with trusted data. The game can not be played.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{kind} mismatch: on-chain {onchain}, local {local}")]
    PrestateMismatch {
        kind: &'static str,
        onchain: Claim,
        local: Claim,
    },
}
