//! JSON-RPC backed implementations of the chain capabilities.

use crate::{
    bindings::{IDisputeGameFactory, IFaultDisputeGame},
    ContractProvider, GameContract, GameDiscovery, GameMetadata,
};
use alloy_primitives::{Address, U256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types::{TransactionInput, TransactionRequest};
use alloy_sol_types::SolCall;
use anyhow::{anyhow, Result};
use balin_fault::ClaimData;
use balin_primitives::{Claim, GameStatus, GameType};
use futures::future::try_join_all;
use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use url::Url;

/// The [L1Provider] talks to the L1 endpoint.
pub type L1Provider = DynProvider;

/// Connects to the L1 endpoint at `url`.
pub fn l1_provider(url: impl AsRef<str>) -> Result<L1Provider> {
    let provider = ProviderBuilder::new().on_http(Url::parse(url.as_ref())?);
    Ok(DynProvider::new(provider))
}

/// Executes `call` against the contract at `to` on the latest block and decodes its return data.
pub(crate) async fn eth_call<C: SolCall>(
    provider: &L1Provider,
    from: Option<Address>,
    to: Address,
    call: C,
) -> Result<C::Return> {
    let mut request = TransactionRequest::default()
        .to(to)
        .input(TransactionInput::new(call.abi_encode().into()));
    if let Some(from) = from {
        request = request.from(from);
    }
    let data = provider.call(request).await?;
    Ok(C::abi_decode_returns(&data, true)?)
}

fn to_u64(value: U256, name: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("{name} does not fit in 64 bits: {value}"))
}

fn to_u8(value: U256, name: &str) -> Result<u8> {
    u8::try_from(value).map_err(|_| anyhow!("{name} does not fit in 8 bits: {value}"))
}

/// The [RpcGameContract] reads a FaultDisputeGame through `eth_call`.
#[derive(Clone)]
pub struct RpcGameContract {
    provider: L1Provider,
    address: Address,
    /// The account that `resolve()` is simulated from.
    sender: Address,
}

impl RpcGameContract {
    pub fn new(provider: L1Provider, address: Address, sender: Address) -> Self {
        Self {
            provider,
            address,
            sender,
        }
    }

    async fn call<C: SolCall>(&self, call: C) -> Result<C::Return> {
        eth_call(&self.provider, None, self.address, call).await
    }
}

#[async_trait::async_trait]
impl GameContract for RpcGameContract {
    async fn block_range(&self) -> Result<(u64, u64)> {
        let (start, end) = tokio::try_join!(
            self.call(IFaultDisputeGame::genesisBlockNumberCall {}),
            self.call(IFaultDisputeGame::l2BlockNumberCall {})
        )?;
        Ok((
            to_u64(start.genesisBlockNumber_, "genesis block number")?,
            to_u64(end.l2BlockNumber_, "l2 block number")?,
        ))
    }

    async fn split_depth(&self) -> Result<u8> {
        let depth = self.call(IFaultDisputeGame::splitDepthCall {}).await?;
        to_u8(depth.splitDepth_, "split depth")
    }

    async fn max_depth(&self) -> Result<u8> {
        let depth = self.call(IFaultDisputeGame::maxGameDepthCall {}).await?;
        to_u8(depth.maxGameDepth_, "max game depth")
    }

    async fn max_clock_duration(&self) -> Result<u64> {
        let duration = self.call(IFaultDisputeGame::gameDurationCall {}).await?;
        Ok(duration.gameDuration_ / 2)
    }

    async fn absolute_prestate(&self) -> Result<Claim> {
        let prestate = self.call(IFaultDisputeGame::absolutePrestateCall {}).await?;
        Ok(prestate.absolutePrestate_)
    }

    async fn genesis_output_root(&self) -> Result<Claim> {
        let root = self.call(IFaultDisputeGame::genesisOutputRootCall {}).await?;
        Ok(root.genesisOutputRoot_)
    }

    async fn claims(&self) -> Result<Vec<ClaimData>> {
        let len = self.call(IFaultDisputeGame::claimDataLenCall {}).await?;
        let len = to_u64(len.len_, "claim count")?;

        try_join_all((0..len).map(|i| async move {
            let data = self
                .call(IFaultDisputeGame::claimDataCall {
                    _index: U256::from(i),
                })
                .await?;
            Ok::<_, anyhow::Error>(ClaimData {
                parent_index: data.parentIndex,
                countered: data.counteredBy != Address::ZERO,
                claimant: data.claimant,
                value: data.claim,
                position: data.position,
                clock: data.clock,
            })
        }))
        .await
    }

    async fn status(&self) -> Result<GameStatus> {
        let status = self.call(IFaultDisputeGame::statusCall {}).await?;
        GameStatus::try_from(status.status_)
    }

    async fn call_resolve(&self) -> Result<GameStatus> {
        let status = eth_call(
            &self.provider,
            Some(self.sender),
            self.address,
            IFaultDisputeGame::resolveCall {},
        )
        .await?;
        GameStatus::try_from(status.status_)
    }
}

/// The [RpcContractProvider] hands out [RpcGameContract]s sharing one provider.
#[derive(Clone)]
pub struct RpcContractProvider {
    provider: L1Provider,
    sender: Address,
}

impl RpcContractProvider {
    pub fn new(provider: L1Provider, sender: Address) -> Self {
        Self { provider, sender }
    }
}

impl ContractProvider for RpcContractProvider {
    fn contract(&self, address: Address) -> Arc<dyn GameContract> {
        Arc::new(RpcGameContract::new(
            self.provider.clone(),
            address,
            self.sender,
        ))
    }
}

/// The [RpcGameFactory] discovers games through the dispute game factory, newest first, stopping at the first game
/// created before the game window.
#[derive(Clone)]
pub struct RpcGameFactory {
    provider: L1Provider,
    address: Address,
    window: Duration,
}

impl RpcGameFactory {
    pub fn new(provider: L1Provider, address: Address, window: Duration) -> Self {
        Self {
            provider,
            address,
            window,
        }
    }
}

#[async_trait::async_trait]
impl GameDiscovery for RpcGameFactory {
    async fn games(&self) -> Result<Vec<GameMetadata>> {
        let count = eth_call(
            &self.provider,
            None,
            self.address,
            IDisputeGameFactory::gameCountCall {},
        )
        .await?;
        let count = to_u64(count.gameCount_, "game count")?;

        let now = SystemTime::now().duration_since(UNIX_EPOCH)?;
        let oldest = now.saturating_sub(self.window).as_secs();

        let mut games = Vec::new();
        for index in (0..count).rev() {
            let game = eth_call(
                &self.provider,
                None,
                self.address,
                IDisputeGameFactory::gameAtIndexCall {
                    _index: U256::from(index),
                },
            )
            .await?;
            if game.timestamp_ < oldest {
                break;
            }
            games.push(GameMetadata {
                address: game.proxy_,
                game_type: GameType::from(game.gameType_),
                timestamp: game.timestamp_,
            });
        }
        Ok(games)
    }
}
