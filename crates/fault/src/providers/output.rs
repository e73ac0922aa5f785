//! This module contains the implementation of the [crate::TraceProvider] trait for fetching output roots from the
//! rollup node.

use crate::{Gindex, OutputSource, Position, PrestateProvider, TraceProvider};
use alloy_primitives::{B256, U64};
use alloy_rpc_client::{ClientBuilder, RpcClient};
use alloy_transport::TransportResult;
use anyhow::{bail, Result};
use balin_primitives::Claim;
use reqwest::Url;
use std::sync::Arc;

/// The [OutputTraceProvider] is a [TraceProvider] that provides L2 output commitments relative to a [Position] in the
/// output bisection portion of the dispute game.
///
/// Each leaf of the output bisection tree commits to the output root one block after its left neighbour, starting
/// one block after `prestate_block`. Leaves beyond `poststate_block` commit to the output root at `poststate_block`.
#[derive(Debug, Clone)]
pub struct OutputTraceProvider<S: OutputSource> {
    pub source: S,
    pub prestate_block: u64,
    pub poststate_block: u64,
    pub split_depth: u8,
}

impl<S: OutputSource> OutputTraceProvider<S> {
    pub fn new(source: S, prestate_block: u64, poststate_block: u64, split_depth: u8) -> Self {
        Self {
            source,
            prestate_block,
            poststate_block,
            split_depth,
        }
    }

    /// Returns the L2 block number that a [Position] in the output bisection commits to.
    pub fn block_number(&self, position: Position) -> Result<u64> {
        if position.depth() > self.split_depth {
            bail!(
                "Position at depth {} is below the output bisection (split depth {})",
                position.depth(),
                self.split_depth
            );
        }
        let trace_index = position.trace_index(self.split_depth);
        Ok(self
            .prestate_block
            .saturating_add(trace_index)
            .saturating_add(1)
            .min(self.poststate_block))
    }

    /// Returns the output root at the given block number.
    pub async fn output_at_block(&self, block_number: u64) -> Result<Claim> {
        self.source.output_at_block(block_number).await
    }
}

#[async_trait::async_trait]
impl<S: OutputSource> TraceProvider for OutputTraceProvider<S> {
    async fn absolute_prestate(&self, _: Position) -> Result<Arc<[u8]>> {
        let output_root = self.source.output_at_block(self.prestate_block).await?;
        Ok(Arc::<[u8; 32]>::new(output_root.0))
    }

    async fn absolute_prestate_hash(&self, _: Position) -> Result<Claim> {
        // The raw state is equivalent to the state hash in the output trace provider.
        self.source.output_at_block(self.prestate_block).await
    }

    async fn state_at(&self, position: Position) -> Result<Arc<[u8]>> {
        Ok(Arc::<[u8; 32]>::new(self.state_hash(position).await?.0))
    }

    async fn state_hash(&self, position: Position) -> Result<Claim> {
        self.source
            .output_at_block(self.block_number(position)?)
            .await
    }

    async fn proof_at(&self, _: Position) -> Result<Arc<[u8]>> {
        bail!("Proofs are not supported for the OutputTraceProvider")
    }
}

#[async_trait::async_trait]
impl<S: OutputSource> PrestateProvider for OutputTraceProvider<S> {
    async fn absolute_prestate_hash(&self) -> Result<Claim> {
        self.source.output_at_block(self.prestate_block).await
    }
}

/// A minified response of the `optimism_outputAtBlock` RPC method from the rollup node, containing only the output root
/// requested.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputAtBlockResponse {
    pub output_root: B256,
}

/// The [RollupNode] is an [OutputSource] backed by a trusted rollup node's `optimism_outputAtBlock` RPC method.
#[derive(Debug, Clone)]
pub struct RollupNode {
    pub rpc_client: RpcClient,
}

impl RollupNode {
    pub fn try_new(rollup_url: impl AsRef<str>) -> Result<Self> {
        let rpc_client = ClientBuilder::default().http(Url::parse(rollup_url.as_ref())?);
        Ok(Self { rpc_client })
    }
}

#[async_trait::async_trait]
impl OutputSource for RollupNode {
    async fn output_at_block(&self, block_number: u64) -> Result<Claim> {
        let result: TransportResult<OutputAtBlockResponse> = self
            .rpc_client
            .request("optimism_outputAtBlock", (U64::from(block_number),))
            .await;
        Ok(result?.output_root)
    }
}
