//! Validators check a game's fixed parameters against trusted data before any move is made.

use crate::{GameContract, ValidationError};
use anyhow::Result;
use balin_fault::PrestateProvider;
use std::sync::Arc;

/// A [Validator] is a pre-flight check that runs before a player makes its first move.
///
/// An error downcasting to [ValidationError] means the game can never be played. Any other error is transient and the
/// check is run again later.
#[async_trait::async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self) -> Result<()>;
}

/// The commitment that a [PrestateValidator] checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrestateKind {
    /// The absolute prestate of the execution trace.
    Absolute,
    /// The output root that the output bisection starts from.
    Genesis,
}

impl PrestateKind {
    fn name(&self) -> &'static str {
        match self {
            PrestateKind::Absolute => "absolute prestate",
            PrestateKind::Genesis => "genesis output root",
        }
    }
}

/// The [PrestateValidator] compares a commitment fixed at game creation to the one computed by a
/// [PrestateProvider].
pub struct PrestateValidator<P: PrestateProvider> {
    kind: PrestateKind,
    contract: Arc<dyn GameContract>,
    provider: P,
}

impl<P: PrestateProvider> PrestateValidator<P> {
    /// Checks the game's absolute prestate against the execution trace's prestate.
    pub fn absolute(contract: Arc<dyn GameContract>, provider: P) -> Self {
        Self {
            kind: PrestateKind::Absolute,
            contract,
            provider,
        }
    }

    /// Checks the game's genesis output root against the output root at the start of its block range.
    pub fn genesis(contract: Arc<dyn GameContract>, provider: P) -> Self {
        Self {
            kind: PrestateKind::Genesis,
            contract,
            provider,
        }
    }
}

#[async_trait::async_trait]
impl<P: PrestateProvider> Validator for PrestateValidator<P> {
    async fn validate(&self) -> Result<()> {
        let onchain = match self.kind {
            PrestateKind::Absolute => self.contract.absolute_prestate().await?,
            PrestateKind::Genesis => self.contract.genesis_output_root().await?,
        };
        let local = self.provider.absolute_prestate_hash().await?;

        if onchain != local {
            return Err(ValidationError::PrestateMismatch {
                kind: self.kind.name(),
                onchain,
                local,
            }
            .into());
        }
        Ok(())
    }
}
