//! The capabilities that the agent consumes from the L1 chain.

use crate::{GameMetadata, TxCandidate, TxReceipt};
use alloy_primitives::Address;
use anyhow::Result;
use balin_fault::ClaimData;
use balin_primitives::{Claim, GameStatus};
use std::sync::Arc;

/// A [GameContract] reads the on-chain state of a single FaultDisputeGame.
#[async_trait::async_trait]
pub trait GameContract: Send + Sync {
    /// Returns the L2 block numbers that the output bisection starts and ends at.
    async fn block_range(&self) -> Result<(u64, u64)>;

    /// Returns the depth at which the output bisection hands off to the execution trace bisection.
    async fn split_depth(&self) -> Result<u8>;

    /// Returns the maximum depth of the game's position tree.
    async fn max_depth(&self) -> Result<u8>;

    /// Returns the seconds that each side's chess clock may run before its claims can no longer be countered.
    async fn max_clock_duration(&self) -> Result<u64>;

    /// Returns the absolute prestate hash of the execution trace.
    async fn absolute_prestate(&self) -> Result<Claim>;

    /// Returns the output root that the output bisection starts from.
    async fn genesis_output_root(&self) -> Result<Claim>;

    /// Returns every claim made in the game so far.
    async fn claims(&self) -> Result<Vec<ClaimData>>;

    /// Returns the status of the game.
    async fn status(&self) -> Result<GameStatus>;

    /// Simulates resolving the game and returns the status it would settle with. Errors if the game can not be
    /// resolved yet.
    async fn call_resolve(&self) -> Result<GameStatus>;
}

/// A [ContractProvider] hands out [GameContract]s by address.
pub trait ContractProvider: Send + Sync {
    fn contract(&self, address: Address) -> Arc<dyn GameContract>;
}

/// A [GameDiscovery] lists the games that the agent should currently be playing.
#[async_trait::async_trait]
pub trait GameDiscovery: Send + Sync {
    async fn games(&self) -> Result<Vec<GameMetadata>>;
}

/// A [TxSubmitter] lands transactions on L1, retrying on its own. An error is a definitive failure.
#[async_trait::async_trait]
pub trait TxSubmitter: Send + Sync {
    async fn submit(&self, tx: TxCandidate) -> Result<TxReceipt>;
}
