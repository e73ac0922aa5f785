//! This module contains a deterministic [crate::TraceOracle] that stands in for a real fault proof VM.

use crate::{LocalInputs, StepWitness, TraceOracle, VMStatus};
use alloy_primitives::{keccak256, Bytes, U256};
use alloy_sol_types::{sol, SolType};
use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};

type MockStateConstruction = sol! { tuple(uint256, uint256) };

/// The [MockTraceOracle] is a [TraceOracle] whose program exits at `last_step`. The state at every step encodes the
/// disputed block number and the step. It counts how many times it has been asked to execute.
#[derive(Debug, Default)]
pub struct MockTraceOracle {
    pub last_step: u64,
    calls: AtomicUsize,
}

impl MockTraceOracle {
    pub fn new(last_step: u64) -> Self {
        Self {
            last_step,
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns the number of times the oracle has executed the program.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Computes the witness at `step` without counting it as an execution.
    pub fn witness(&self, disputed_block_number: u64, step: u64) -> StepWitness {
        let step = step.min(self.last_step);
        let exited = step == self.last_step;
        let state = MockStateConstruction::abi_encode(&(
            U256::from(disputed_block_number),
            U256::from(step),
        ));
        let status = if exited {
            VMStatus::Valid
        } else {
            VMStatus::Unfinished
        };
        let mut state_hash = keccak256(&state);
        state_hash[0] = status as u8;

        StepWitness {
            step,
            state: Bytes::from(state),
            state_hash,
            proof: Bytes::from(step.to_be_bytes().to_vec()),
            exited,
        }
    }
}

#[async_trait::async_trait]
impl TraceOracle for MockTraceOracle {
    async fn prestate(&self) -> Result<StepWitness> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let state = MockStateConstruction::abi_encode(&(U256::ZERO, U256::ZERO));
        let mut state_hash = keccak256(&state);
        state_hash[0] = VMStatus::Unfinished as u8;
        Ok(StepWitness {
            step: 0,
            state: Bytes::from(state),
            state_hash,
            proof: Bytes::new(),
            exited: false,
        })
    }

    async fn step_at(&self, inputs: &LocalInputs, step: u64) -> Result<StepWitness> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.witness(inputs.disputed_block_number, step))
    }
}
