//! This module holds traits related to the [FaultDisputeGame]

use crate::{
    state::ClaimData, FaultDisputeState, FaultSolverResponse, LocalInputs, Position, StepWitness,
};
use anyhow::Result;
use balin_primitives::{Claim, DisputeGame};
use std::sync::Arc;

/// A [FaultDisputeGame] is a [DisputeGame] that is played over a FaultVM backend. This
/// trait extends the [DisputeGame] trait with functionality that is specific to the
/// fault [balin_primitives::GameType] variants.
pub trait FaultDisputeGame: DisputeGame {
    /// Returns a shared reference to the raw state of the game DAG.
    fn state(&self) -> &[ClaimData];

    /// Returns the depth at which the output bisection hands off to the execution trace bisection.
    fn split_depth(&self) -> u8;

    /// Returns the maximum depth of the game's position tree.
    fn max_depth(&self) -> u8;
}

/// A [FaultClaimSolver] is a solver that finds the correct response to a given [balin_primitives::Claim]
/// within a [FaultDisputeGame].
#[async_trait::async_trait]
pub trait FaultClaimSolver<P: TraceProvider> {
    /// Finds the best move against a [crate::ClaimData] in a given [FaultDisputeState].
    ///
    /// ### Takes
    /// - `world`: The [FaultDisputeState] to solve against.
    /// - `claim_index`: The index of the claim within the state DAG.
    /// - `attacking_root`: A boolean indicating whether or not the solver is attacking the root.
    ///
    /// ### Returns
    /// - [FaultSolverResponse] or [Err]: The best move against the claim.
    async fn solve_claim(
        &self,
        world: &FaultDisputeState,
        claim_index: usize,
        attacking_root: bool,
    ) -> Result<FaultSolverResponse>;

    /// Returns a shared reference to the [TraceProvider] that the solver uses to fetch the state of the VM and
    /// commitments to it.
    fn provider(&self) -> &P;
}

/// A [TraceProvider] is a type that can provide the raw state (in bytes) at a given [Position] within
/// a [FaultDisputeGame].
///
/// Implementations must be deterministic: asking for the same [Position] twice yields the same answer.
#[async_trait::async_trait]
pub trait TraceProvider: Send + Sync {
    /// Returns the raw absolute prestate (in bytes) of the trace that the [Position] belongs to.
    async fn absolute_prestate(&self, position: Position) -> Result<Arc<[u8]>>;

    /// Returns the absolute prestate hash of the trace that the [Position] belongs to.
    async fn absolute_prestate_hash(&self, position: Position) -> Result<Claim>;

    /// Returns the raw state (in bytes) at the given position.
    async fn state_at(&self, position: Position) -> Result<Arc<[u8]>>;

    /// Returns the state hash at the given position.
    async fn state_hash(&self, position: Position) -> Result<Claim>;

    /// Returns the raw proof for the commitment at the given position.
    async fn proof_at(&self, position: Position) -> Result<Arc<[u8]>>;
}

/// A [PrestateProvider] commits to the fixed starting state of a trace, independent of any [Position].
#[async_trait::async_trait]
pub trait PrestateProvider: Send + Sync {
    /// Returns the absolute prestate hash.
    async fn absolute_prestate_hash(&self) -> Result<Claim>;
}

/// A [TraceProviderFactory] builds the execution trace [TraceProvider] for the subgame rooted beneath a claim at the
/// split depth. Positions handed to the built provider are local to that subgame.
#[async_trait::async_trait]
pub trait TraceProviderFactory: PrestateProvider {
    /// The [TraceProvider] serving a single subgame.
    type Provider: TraceProvider;

    /// Returns the [TraceProvider] for the subgame selected by the given [LocalInputs].
    async fn provider_for(&self, inputs: LocalInputs) -> Result<Self::Provider>;
}

/// An [OutputSource] serves the canonical L2 output root at a given block number.
#[async_trait::async_trait]
pub trait OutputSource: Send + Sync {
    /// Returns the output root at the given L2 block number.
    async fn output_at_block(&self, block_number: u64) -> Result<Claim>;
}

#[async_trait::async_trait]
impl<T: OutputSource + ?Sized> OutputSource for Arc<T> {
    async fn output_at_block(&self, block_number: u64) -> Result<Claim> {
        (**self).output_at_block(block_number).await
    }
}

/// A [TraceOracle] executes the fault proof program for a subgame and reports the VM state at single instructions.
#[async_trait::async_trait]
pub trait TraceOracle: Send + Sync {
    /// Returns the VM state before the first instruction of the program.
    async fn prestate(&self) -> Result<StepWitness>;

    /// Returns the VM state after executing the instruction at `step`. If the program exits before `step`, the
    /// witness of the final instruction is returned instead, with [StepWitness::exited] set.
    async fn step_at(&self, inputs: &LocalInputs, step: u64) -> Result<StepWitness>;
}

/// The [Gindex] trait defines the interface of a generalized index within a binary tree.
/// A "Generalized Index" is calculated as `2^{depth} + index_at_depth`.
pub trait Gindex {
    /// Returns the depth of the [Position] within the tree.
    fn depth(&self) -> u8;

    /// Returns the index at depth of the [Position] within the tree.
    fn index_at_depth(&self) -> u64;

    /// Returns the left child [Position] relative to the current [Position].
    fn left(&self) -> Self;

    /// Returns the right child [Position] relative to the current [Position].
    fn right(&self) -> Self;

    /// Returns the parent [Position] relative to the current [Position].
    fn parent(&self) -> Self;

    /// Returns the rightmost [Position] that commits to the same trace index as the current [Position].
    fn right_index(&self, max_depth: u8) -> Self;

    /// Returns the trace index that the current [Position] commits to.
    fn trace_index(&self, max_depth: u8) -> u64;

    /// Returns the relative [Position] for an attack or defense move against the current [Position].
    fn make_move(&self, is_attack: bool) -> Self;
}

/// The [ChessClock] trait defines the interface of a single side of a chess clock at a given state in time.
pub trait ChessClock {
    /// Returns the seconds elapsed on the chess clock when it was last stopped.
    fn duration(&self) -> u64;

    /// Returns the timestamp of when the chess clock was last stopped.
    fn timestamp(&self) -> u64;
}
