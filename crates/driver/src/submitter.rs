//! The [RpcTxSubmitter] sends transactions through the L1 endpoint's `eth_sendTransaction`.

use crate::{rpc::L1Provider, TxCandidate, TxReceipt, TxSubmitter};
use alloy_primitives::Address;
use alloy_provider::Provider;
use alloy_rpc_types::{TransactionInput, TransactionRequest};
use anyhow::{anyhow, bail, Result};
use std::time::Duration;

/// The delay before the first resubmission. It doubles with every attempt.
const BASE_BACKOFF: Duration = Duration::from_secs(1);

/// The [RpcTxSubmitter] is a [TxSubmitter] that leaves signing to the L1 endpoint. A transaction that could not be
/// sent, or whose receipt did not show up in time, is resubmitted with exponential backoff. A reverted transaction is
/// a definitive failure.
#[derive(Clone)]
pub struct RpcTxSubmitter {
    provider: L1Provider,
    sender: Address,
    receipt_timeout: Duration,
    max_attempts: u32,
}

impl RpcTxSubmitter {
    pub fn new(
        provider: L1Provider,
        sender: Address,
        receipt_timeout: Duration,
        max_attempts: u32,
    ) -> Self {
        Self {
            provider,
            sender,
            receipt_timeout,
            max_attempts,
        }
    }

    /// Sends `tx` once and waits for its receipt.
    async fn send(&self, tx: &TxCandidate) -> Result<TxReceipt> {
        let request = TransactionRequest::default()
            .from(self.sender)
            .to(tx.to)
            .input(TransactionInput::new(tx.data.clone()));
        let pending = self.provider.send_transaction(request).await?;
        tracing::debug!(target: "tx-submitter", "Sent transaction {} to {}", pending.tx_hash(), tx.to);

        let receipt = pending
            .with_timeout(Some(self.receipt_timeout))
            .get_receipt()
            .await?;
        Ok(TxReceipt {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number.unwrap_or_default(),
            success: receipt.status(),
        })
    }
}

#[async_trait::async_trait]
impl TxSubmitter for RpcTxSubmitter {
    async fn submit(&self, tx: TxCandidate) -> Result<TxReceipt> {
        let mut backoff = BASE_BACKOFF;
        let mut last_error = anyhow!("No submission attempts were made");

        for attempt in 1..=self.max_attempts {
            match self.send(&tx).await {
                Ok(receipt) if receipt.success => {
                    tracing::info!(target: "tx-submitter", "Transaction {} to {} landed in block {}", receipt.tx_hash, tx.to, receipt.block_number);
                    return Ok(receipt);
                }
                Ok(receipt) => {
                    bail!("Transaction {} to {} reverted", receipt.tx_hash, tx.to);
                }
                Err(e) => {
                    tracing::warn!(target: "tx-submitter", "Attempt {}/{} to submit to {} failed: {}", attempt, self.max_attempts, tx.to, e);
                    last_error = e;
                }
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
        }

        Err(last_error.context(format!(
            "Giving up on transaction to {} after {} attempts",
            tx.to, self.max_attempts
        )))
    }
}
