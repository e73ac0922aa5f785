//! Implementation of the [FaultClaimSolver] trait for games that split the output bisection from the execution trace
//! bisection.

use crate::{
    providers::SplitTraceProvider, FaultClaimSolver, FaultDisputeGame, FaultDisputeState,
    FaultSolverResponse, Gindex, OutputSource, TraceProvider, TraceProviderFactory,
};
use anyhow::{anyhow, Result};

/// The [SplitClaimSolver] solves claims across both bisection layers of the game. At the max depth it produces VM
/// steps against the execution trace.
pub struct SplitClaimSolver<S, F>
where
    S: OutputSource,
    F: TraceProviderFactory,
{
    provider: SplitTraceProvider<S, F>,
}

#[async_trait::async_trait]
impl<S, F> FaultClaimSolver<SplitTraceProvider<S, F>> for SplitClaimSolver<S, F>
where
    S: OutputSource,
    F: TraceProviderFactory,
{
    async fn solve_claim(
        &self,
        world: &FaultDisputeState,
        claim_index: usize,
        attacking_root: bool,
    ) -> Result<FaultSolverResponse> {
        let (split_depth, max_depth) = (world.split_depth, world.max_depth);

        let claim = world
            .state()
            .get(claim_index)
            .ok_or(anyhow!("Failed to fetch claim from passed state"))?;
        let claim_depth = claim.position.depth();

        // The root claim can only ever be attacked.
        if claim.is_root() {
            if !attacking_root {
                return Ok(FaultSolverResponse::Skip(claim_index));
            }
            let move_pos = claim.position.make_move(true);
            let claimed_hash = self.provider.state_hash(move_pos).await?;
            if world.is_duplicate(claim_index, move_pos, claimed_hash) {
                return Ok(FaultSolverResponse::Skip(claim_index));
            }
            return Ok(FaultSolverResponse::Move(true, claim_index, claimed_hash));
        }

        // Never counter a claim that is on a level we agree with, even if it is wrong. If it is uncountered, it
        // furthers the goal of the honest challenger, and even if it is countered, the step will prove that it is
        // also wrong.
        let right_level = attacking_root != (claim_depth % 2 == 0);
        if right_level {
            return Ok(FaultSolverResponse::Skip(claim_index));
        }

        let local_claim = self.provider.state_hash(claim.position).await?;
        let local_agree = local_claim == claim.value;

        // Never defend an execution trace subgame root. We only attack it if we disagree with it.
        if claim_depth == split_depth + 1 && local_agree {
            return Ok(FaultSolverResponse::Skip(claim_index));
        }

        if claim_depth == max_depth {
            // The step executes the instruction that produces the state at `post` from the state before it. An
            // attack disputes the claimed state itself, a defense the state right after it.
            let is_attack = !local_agree;
            let leaf_mask = (1u128 << (max_depth - split_depth - 1)) - 1;
            let local_index = claim.position & leaf_mask;
            if !is_attack && local_index == leaf_mask {
                // There is no instruction past the end of the trace to step over.
                return Ok(FaultSolverResponse::Skip(claim_index));
            }

            let post = claim.position + (!is_attack) as u128;
            let prestate = if post & leaf_mask == 0 {
                self.provider.absolute_prestate(post).await?
            } else {
                self.provider.state_at(post - 1).await?
            };
            let proof = self.provider.proof_at(post).await?;
            return Ok(FaultSolverResponse::Step(
                is_attack,
                claim_index,
                prestate,
                proof,
            ));
        }

        // If we agree with the claim, we bisect right, otherwise we bisect left.
        let move_pos = claim.position.make_move(!local_agree);
        let move_claim = self.provider.state_hash(move_pos).await?;
        if world.is_duplicate(claim_index, move_pos, move_claim) {
            return Ok(FaultSolverResponse::Skip(claim_index));
        }
        Ok(FaultSolverResponse::Move(
            !local_agree,
            claim_index,
            move_claim,
        ))
    }

    fn provider(&self) -> &SplitTraceProvider<S, F> {
        &self.provider
    }
}

impl<S, F> SplitClaimSolver<S, F>
where
    S: OutputSource,
    F: TraceProviderFactory,
{
    pub fn new(provider: SplitTraceProvider<S, F>) -> Self {
        Self { provider }
    }
}
