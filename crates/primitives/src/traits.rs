//! The traits module contains traits used throughout the library.

use crate::{dispute_game::Claim, GameStatus};
use std::sync::Arc;

/// The [DisputeGame] trait is the highest level trait in the library, describing
/// the state of a simple primitive dispute. It has several key properties:
///
/// - It houses a root [Claim], a 32 byte commitment, which is the claim being
///   disputed.
/// - It can exist in one of three states, as indicated by the [GameStatus] enum.
///     1. [GameStatus::InProgress] - The dispute game is still in progress.
///     2. [GameStatus::ChallengerWins] - The challenger of the root claim has won
///        the dispute game.
///     3. [GameStatus::DefenderWins] - The defender of the root claim has won the
///        dispute game.
///
/// The resolution mechanism lives on-chain; implementors only mirror what was
/// last observed there.
pub trait DisputeGame {
    /// Returns the root claim of the dispute game. The root claim is a 32 byte
    /// commitment to what is being disputed.
    ///
    /// This claim can be about anything - the only requirement is that it is
    /// a 32 byte commitment.
    fn root_claim(&self) -> Claim;

    /// Returns the current status of the dispute game.
    fn status(&self) -> &GameStatus;
}

/// The [DisputeSolver] trait describes the base functionality of a solver for
/// a [DisputeGame].
#[async_trait::async_trait]
pub trait DisputeSolver<DG: DisputeGame + Sync, R> {
    /// Returns the responses of the solver to every claim in the [DisputeGame] that it
    /// has not yet seen countered. The consumer of the responses is responsible for
    /// dispatching the actions associated with them.
    async fn available_moves(&self, game: &DG) -> anyhow::Result<Arc<[R]>>;
}
