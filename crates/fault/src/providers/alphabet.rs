//! This module contains the implementation of the [crate::TraceProvider] trait for the mock Alphabet VM.

use crate::{
    Gindex, LocalInputs, Position, PrestateProvider, TraceProvider, TraceProviderFactory, VMStatus,
};
use alloy_primitives::{keccak256, U256};
use alloy_sol_types::{sol, SolType};
use anyhow::Result;
use balin_primitives::Claim;
use std::sync::Arc;

type AlphabetClaimConstruction = sol! { tuple(uint256, uint256) };

/// The [AlphabetTraceProvider] is a [TraceProvider] that provides the correct trace for the mock Alphabet VM.
#[derive(Debug, Clone, Copy)]
pub struct AlphabetTraceProvider {
    /// The absolute prestate of the alphabet VM is the setup state. This will be the ascii representation of letter
    /// prior to the first in the honest alphabet trace.
    pub absolute_prestate: [u8; 32],
    /// The maximum depth of the dispute game position tree.
    pub max_depth: u8,
}

impl AlphabetTraceProvider {
    pub fn new(absolute_prestate: u64, max_depth: u8) -> Self {
        Self {
            absolute_prestate: U256::from(absolute_prestate).to_be_bytes(),
            max_depth,
        }
    }

    fn prestate_hash(&self) -> Claim {
        let prestate = U256::from_be_bytes(self.absolute_prestate);
        let mut prestate_hash = keccak256(<sol!(uint256)>::abi_encode(&prestate));
        prestate_hash[0] = VMStatus::Unfinished as u8;
        prestate_hash
    }
}

#[async_trait::async_trait]
impl TraceProvider for AlphabetTraceProvider {
    async fn absolute_prestate(&self, _: Position) -> Result<Arc<[u8]>> {
        Ok(Arc::new(self.absolute_prestate))
    }

    async fn absolute_prestate_hash(&self, _: Position) -> Result<Claim> {
        Ok(self.prestate_hash())
    }

    async fn state_at(&self, position: Position) -> Result<Arc<[u8]>> {
        let absolute_prestate = U256::from_be_bytes(self.absolute_prestate);
        let trace_index = U256::from(position.trace_index(self.max_depth));

        let state = absolute_prestate + trace_index + U256::from(1);
        Ok(Arc::<[u8; 32]>::new(state.to_be_bytes()))
    }

    async fn state_hash(&self, position: Position) -> Result<Claim> {
        let state: [u8; 32] = (*self.state_at(position).await?).try_into()?;
        let state_sol = (
            U256::from(position.trace_index(self.max_depth)),
            U256::from_be_bytes(state),
        );
        let mut state_hash = keccak256(AlphabetClaimConstruction::abi_encode(&state_sol));
        state_hash[0] = VMStatus::Invalid as u8;
        Ok(state_hash)
    }

    async fn proof_at(&self, _: Position) -> Result<Arc<[u8]>> {
        Ok(Arc::new([]))
    }
}

/// The [AlphabetTraceFactory] serves the same [AlphabetTraceProvider] for every execution subgame; the alphabet VM's
/// trace does not depend on the disputed block.
#[derive(Debug, Clone, Copy)]
pub struct AlphabetTraceFactory {
    pub absolute_prestate: u64,
    /// The depth of a single execution subgame's position tree.
    pub depth: u8,
}

impl AlphabetTraceFactory {
    pub fn new(absolute_prestate: u64, depth: u8) -> Self {
        Self {
            absolute_prestate,
            depth,
        }
    }
}

#[async_trait::async_trait]
impl PrestateProvider for AlphabetTraceFactory {
    async fn absolute_prestate_hash(&self) -> Result<Claim> {
        Ok(AlphabetTraceProvider::new(self.absolute_prestate, self.depth).prestate_hash())
    }
}

#[async_trait::async_trait]
impl TraceProviderFactory for AlphabetTraceFactory {
    type Provider = AlphabetTraceProvider;

    async fn provider_for(&self, _: LocalInputs) -> Result<Self::Provider> {
        Ok(AlphabetTraceProvider::new(self.absolute_prestate, self.depth))
    }
}
