//! The types module holds the types specific to the [crate::FaultDisputeGame] solver.

use crate::Gindex;
use alloy_primitives::Bytes;
use balin_primitives::Claim;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub type Position = u128;

/// The [FaultSolverResponse] enum describes the response that a solver should return when asked to make a move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultSolverResponse {
    /// A response indicating that the proper move is to attack (`true`) or defend (`false`) the claim at the given
    /// index with the given claim.
    Move(bool, usize, Claim),
    /// A response indicating that the proper move is to skip the given claim.
    Skip(usize),
    /// A response indicating that the proper move is to perform a VM step against the claim at the given index. The
    /// step is an attack (`true`) or a defense (`false`), and carries the raw prestate and its proof.
    Step(bool, usize, Arc<[u8]>, Arc<[u8]>),
}

/// The [VMStatus] enum describes the status of a VM at a given position.
/// - [VMStatus::Valid]: The VM is exited with a valid status.
/// - [VMStatus::Invalid]: The VM is exited with an invalid status.
/// - [VMStatus::Panic]: The VM is exited with a panic status.
/// - [VMStatus::Unfinished]: The VM is not yet exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VMStatus {
    Valid = 0,
    Invalid = 1,
    Panic = 2,
    Unfinished = 3,
}

/// The [LocalInputs] select the execution trace subgame that sits beneath a claim at the split depth: the program is
/// run from the agreed output root and asked to derive the disputed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalInputs {
    /// The L2 block number of the output root both parties agree on.
    pub agreed_block_number: u64,
    /// The output root both parties agree on.
    pub agreed_output_root: Claim,
    /// The L2 block number of the disputed output root.
    pub disputed_block_number: u64,
    /// The trusted output root at the disputed block.
    pub disputed_output_root: Claim,
}

/// A [StepWitness] is the VM state at a single instruction, as produced by an execution trace oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepWitness {
    /// The instruction index that the witness was taken at.
    pub step: u64,
    /// The raw, encoded VM state.
    pub state: Bytes,
    /// The commitment to [StepWitness::state] that is posted as a claim.
    pub state_hash: Claim,
    /// The proof data needed to execute the next instruction on-chain.
    pub proof: Bytes,
    /// Whether or not the VM had exited at [StepWitness::step].
    pub exited: bool,
}

/// Computes a generalized index from a depth and index at depth.
///
/// ### Takes
/// - `depth`: The depth of the generalized index.
/// - `index_at_depth`: The index at depth of the generalized index.
///
/// ### Returns
/// - `u128`: The generalized index: `2^{depth} + index_at_depth`.
pub fn compute_gindex(depth: u8, index_at_depth: u64) -> u128 {
    2u128.pow(depth as u32) + index_at_depth as u128
}

/// Implementation of the [Gindex] trait for the [Position] type alias.
impl Gindex for Position {
    fn depth(&self) -> u8 {
        127 - self.leading_zeros() as u8
    }

    fn index_at_depth(&self) -> u64 {
        (self - (1 << self.depth())) as u64
    }

    fn left(&self) -> Self {
        self << 1
    }

    fn right(&self) -> Self {
        self.left() | 1
    }

    fn parent(&self) -> Self {
        self >> 1
    }

    fn right_index(&self, max_depth: u8) -> Self {
        let remaining = max_depth - self.depth();
        (self << remaining) | ((1 << remaining) - 1)
    }

    fn trace_index(&self, max_depth: u8) -> u64 {
        self.right_index(max_depth).index_at_depth()
    }

    fn make_move(&self, is_attack: bool) -> Self {
        ((!is_attack as u128) | self) << 1
    }
}
