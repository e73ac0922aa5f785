//! The `register` module wires the FaultDisputeGame variants into the [GameTypeRegistry].

use crate::{
    oracle::ProcessTraceOracle, validator::PrestateValidator, ConfigError, ContractProvider,
    DriverConfig, FaultGamePlayer, GameContract, GameMetadata, GamePlayer, GameTypeRegistry,
    PlayerCreator, TraceType, TxSubmitter, Validator,
};
use anyhow::{bail, Result};
use balin_fault::{
    providers::{AlphabetTraceFactory, CannonTraceFactory},
    solvers::SplitClaimSolver,
    FaultDisputeSolver, OutputSource, OutputTraceProvider, SplitTraceProvider, TraceOracle,
    TraceProviderFactory,
};
use std::{io::ErrorKind, path::Path, sync::Arc};

/// The name of the directory inside a game's working directory that holds the cannon cache.
const CANNON_DIR: &str = "cannon";

/// The execution trace that a [FaultPlayerCreator] plays beneath the split depth.
#[derive(Clone)]
pub enum TraceBackend {
    /// Cannon, executed by the given oracle and cached on disk.
    Cannon { oracle: Arc<dyn TraceOracle> },
    /// The Alphabet VM.
    Alphabet { absolute_prestate: u64 },
}

/// The [FaultPlayerCreator] builds [FaultGamePlayer]s that bisect output roots above the split depth and a
/// [TraceBackend] below it.
#[derive(Clone)]
pub struct FaultPlayerCreator {
    pub backend: TraceBackend,
    pub contracts: Arc<dyn ContractProvider>,
    pub outputs: Arc<dyn OutputSource>,
    pub submitter: Arc<dyn TxSubmitter>,
    pub max_consecutive_failures: Option<u32>,
}

impl FaultPlayerCreator {
    #[allow(clippy::too_many_arguments)]
    fn player<F>(
        &self,
        game: GameMetadata,
        contract: Arc<dyn GameContract>,
        top: OutputTraceProvider<Arc<dyn OutputSource>>,
        bottom: F,
        split_depth: u8,
        max_depth: u8,
        max_clock_duration: u64,
    ) -> Box<dyn GamePlayer>
    where
        F: TraceProviderFactory + Clone + 'static,
    {
        let validators: Vec<Box<dyn Validator>> = vec![
            Box::new(PrestateValidator::absolute(contract.clone(), bottom.clone())),
            Box::new(PrestateValidator::genesis(contract.clone(), top.clone())),
        ];
        let solver = FaultDisputeSolver::new(SplitClaimSolver::new(SplitTraceProvider::new(
            top,
            bottom,
            split_depth,
            max_depth,
        )));

        Box::new(FaultGamePlayer::new(
            game,
            contract,
            self.submitter.clone(),
            Box::new(solver),
            validators,
            split_depth,
            max_depth,
            max_clock_duration,
            self.max_consecutive_failures,
        ))
    }
}

#[async_trait::async_trait]
impl PlayerCreator for FaultPlayerCreator {
    async fn create(&self, game: GameMetadata, dir: &Path) -> Result<Box<dyn GamePlayer>> {
        let contract = self.contracts.contract(game.address);
        let ((start, end), split_depth, max_depth, max_clock_duration) = tokio::try_join!(
            contract.block_range(),
            contract.split_depth(),
            contract.max_depth(),
            contract.max_clock_duration()
        )?;
        if split_depth >= max_depth {
            bail!("Split depth {split_depth} is not above max depth {max_depth}");
        }
        if start > end {
            bail!("Block range [{start}, {end}] is empty");
        }

        let top = OutputTraceProvider::new(self.outputs.clone(), start, end, split_depth);
        let bottom_depth = max_depth - split_depth - 1;

        let player = match &self.backend {
            TraceBackend::Cannon { oracle } => {
                let cache = dir.join(CANNON_DIR);
                create_dir(&cache).await?;
                let bottom = CannonTraceFactory::new(oracle.clone(), cache, bottom_depth);
                self.player(game, contract, top, bottom, split_depth, max_depth, max_clock_duration)
            }
            TraceBackend::Alphabet { absolute_prestate } => {
                let bottom = AlphabetTraceFactory::new(*absolute_prestate, bottom_depth);
                self.player(game, contract, top, bottom, split_depth, max_depth, max_clock_duration)
            }
        };

        tracing::debug!(target: "game-player", "Created player for game {} ({}) over blocks [{}, {}], split depth {}, max depth {}", game.address, game.game_type, start, end, split_depth, max_depth);
        Ok(player)
    }
}

/// Creates `dir` beneath its existing parent. An existing directory is reused.
async fn create_dir(dir: &Path) -> Result<()> {
    match tokio::fs::create_dir(dir).await {
        Err(e) if e.kind() != ErrorKind::AlreadyExists => Err(e.into()),
        _ => Ok(()),
    }
}

/// Registers a [FaultPlayerCreator] for every trace type enabled in `config`.
pub fn register_game_types(
    registry: &mut GameTypeRegistry,
    config: &DriverConfig,
    contracts: Arc<dyn ContractProvider>,
    outputs: Arc<dyn OutputSource>,
    submitter: Arc<dyn TxSubmitter>,
) -> Result<()> {
    for trace_type in config.trace_types.iter() {
        let backend = match trace_type {
            TraceType::Cannon => {
                let bin = config
                    .cannon_bin
                    .clone()
                    .ok_or(ConfigError::MissingCannonBin)?;
                TraceBackend::Cannon {
                    oracle: Arc::new(ProcessTraceOracle::new(bin, config.cannon_args.clone())),
                }
            }
            TraceType::Alphabet => TraceBackend::Alphabet {
                absolute_prestate: config.alphabet_prestate,
            },
        };

        registry.register(
            trace_type.game_type(),
            Arc::new(FaultPlayerCreator {
                backend,
                contracts: contracts.clone(),
                outputs: outputs.clone(),
                submitter: submitter.clone(),
                max_consecutive_failures: config.max_consecutive_failures,
            }),
        )?;
        tracing::info!(target: "scheduler", "Registered game type {}", trace_type.game_type());
    }
    Ok(())
}
