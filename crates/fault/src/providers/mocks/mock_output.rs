//! This module contains the implementation of the [crate::OutputSource] trait for serving mock output commitments.

use crate::OutputSource;
use alloy_primitives::U256;
use anyhow::Result;
use balin_primitives::Claim;

/// The [MockOutputSource] is an [OutputSource] that serves the block number, encoded as a big-endian 32 byte word, as
/// the output root of every block.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockOutputSource;

#[async_trait::async_trait]
impl OutputSource for MockOutputSource {
    async fn output_at_block(&self, block_number: u64) -> Result<Claim> {
        Ok(U256::from(block_number).into())
    }
}
