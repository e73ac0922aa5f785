//! This module contains the implementation of the [crate::TraceProvider] trait for composing the output bisection
//! with the execution trace bisection beneath it, based off of the input depth.

use crate::{
    Gindex, LocalInputs, OutputSource, OutputTraceProvider, Position, TraceProvider,
    TraceProviderFactory,
};
use anyhow::{bail, Result};
use balin_primitives::Claim;
use std::sync::Arc;

/// The [SplitTraceProvider] is a [TraceProvider] that serves positions at or above the split depth from an
/// [OutputTraceProvider] and positions below it from an execution trace provider built for the disputed output.
pub struct SplitTraceProvider<S, F>
where
    S: OutputSource,
    F: TraceProviderFactory,
{
    pub top: OutputTraceProvider<S>,
    pub bottom: F,
    pub split_depth: u8,
    pub max_depth: u8,
}

impl<S, F> SplitTraceProvider<S, F>
where
    S: OutputSource,
    F: TraceProviderFactory,
{
    pub fn new(top: OutputTraceProvider<S>, bottom: F, split_depth: u8, max_depth: u8) -> Self {
        Self {
            top,
            bottom,
            split_depth,
            max_depth,
        }
    }

    /// Returns the [LocalInputs] of the execution subgame that `position` belongs to.
    pub async fn local_inputs(&self, position: Position) -> Result<LocalInputs> {
        let depth = position.depth();
        if depth <= self.split_depth {
            bail!("Position at depth {depth} is not part of an execution subgame");
        }

        // The claim at the split depth above the position commits to the disputed output. The leaf to its left
        // commits to the agreed output, or the prestate if there is none.
        let disputed = position >> (depth - self.split_depth);
        let disputed_block_number = self.top.block_number(disputed)?;
        let agreed_block_number = if disputed.index_at_depth() == 0 {
            self.top.prestate_block
        } else {
            self.top.block_number(disputed - 1)?
        };

        Ok(LocalInputs {
            agreed_block_number,
            agreed_output_root: self.top.output_at_block(agreed_block_number).await?,
            disputed_block_number,
            disputed_output_root: self.top.output_at_block(disputed_block_number).await?,
        })
    }

    /// Returns the execution trace provider for the subgame that `position` belongs to, along with the position
    /// translated into that subgame's tree.
    pub async fn bottom_for(&self, position: Position) -> Result<(F::Provider, Position)> {
        let depth = position.depth();
        if depth > self.max_depth {
            bail!(
                "Position at depth {depth} exceeds the max game depth {}",
                self.max_depth
            );
        }

        let inputs = self.local_inputs(position).await?;
        let local_depth = depth - self.split_depth - 1;
        let local = (1u128 << local_depth) | (position & ((1u128 << local_depth) - 1));
        Ok((self.bottom.provider_for(inputs).await?, local))
    }
}

#[async_trait::async_trait]
impl<S, F> TraceProvider for SplitTraceProvider<S, F>
where
    S: OutputSource,
    F: TraceProviderFactory,
{
    async fn absolute_prestate(&self, position: Position) -> Result<Arc<[u8]>> {
        if position.depth() <= self.split_depth {
            self.top.absolute_prestate(position).await
        } else {
            let (bottom, local) = self.bottom_for(position).await?;
            bottom.absolute_prestate(local).await
        }
    }

    async fn absolute_prestate_hash(&self, position: Position) -> Result<Claim> {
        if position.depth() <= self.split_depth {
            self.top.absolute_prestate_hash(position).await
        } else {
            let (bottom, local) = self.bottom_for(position).await?;
            bottom.absolute_prestate_hash(local).await
        }
    }

    async fn state_at(&self, position: Position) -> Result<Arc<[u8]>> {
        if position.depth() <= self.split_depth {
            self.top.state_at(position).await
        } else {
            let (bottom, local) = self.bottom_for(position).await?;
            bottom.state_at(local).await
        }
    }

    async fn state_hash(&self, position: Position) -> Result<Claim> {
        if position.depth() <= self.split_depth {
            self.top.state_hash(position).await
        } else {
            let (bottom, local) = self.bottom_for(position).await?;
            bottom.state_hash(local).await
        }
    }

    async fn proof_at(&self, position: Position) -> Result<Arc<[u8]>> {
        if position.depth() <= self.split_depth {
            self.top.proof_at(position).await
        } else {
            let (bottom, local) = self.bottom_for(position).await?;
            bottom.proof_at(local).await
        }
    }
}
