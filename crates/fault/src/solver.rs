//! This module contains the [FaultDisputeSolver], the [DisputeSolver] for the [crate::FaultDisputeGame].

use crate::{
    FaultClaimSolver, FaultDisputeGame, FaultDisputeState, FaultSolverResponse, Position,
    TraceProvider,
};
use anyhow::Result;
use balin_primitives::{DisputeGame, DisputeSolver};
use futures::future::try_join_all;
use std::{marker::PhantomData, sync::Arc};

/// A [FaultDisputeSolver] is a [DisputeSolver] that is played over a fault proof VM backend. The
/// solver is responsible for honestly responding to any given [crate::ClaimData] in a given
/// [FaultDisputeState]. It uses a [FaultClaimSolver] to find the response to each individual claim.
pub struct FaultDisputeSolver<S, P>
where
    S: FaultClaimSolver<P>,
    P: TraceProvider,
{
    pub inner: S,
    _phantom: PhantomData<P>,
}

#[async_trait::async_trait]
impl<S, P> DisputeSolver<FaultDisputeState, FaultSolverResponse> for FaultDisputeSolver<S, P>
where
    S: FaultClaimSolver<P> + Send + Sync,
    P: TraceProvider,
{
    async fn available_moves(
        &self,
        game: &FaultDisputeState,
    ) -> Result<Arc<[FaultSolverResponse]>> {
        // Fetch the local opinion on the root claim.
        let attacking_root =
            self.provider().state_hash(Self::ROOT_CLAIM_POSITION).await? != game.root_claim();

        // Countered claims have already been answered and claims whose clock ran out can no longer be; every other
        // claim is solved concurrently.
        let responses = try_join_all(game.state().iter().enumerate().map(|(i, claim)| async move {
            if claim.countered || game.clock_expired(i) {
                Ok(FaultSolverResponse::Skip(i))
            } else {
                self.inner.solve_claim(game, i, attacking_root).await
            }
        }))
        .await?;

        Ok(responses.into())
    }
}

impl<S, P> FaultDisputeSolver<S, P>
where
    S: FaultClaimSolver<P>,
    P: TraceProvider,
{
    const ROOT_CLAIM_POSITION: Position = 1;

    pub fn new(claim_solver: S) -> Self {
        Self {
            inner: claim_solver,
            _phantom: PhantomData,
        }
    }

    /// Returns a shared reference to the [TraceProvider] backing the claim solver.
    pub fn provider(&self) -> &P {
        self.inner.provider()
    }
}
