//! The `driver` module wires the configured chain capabilities, game types and [Scheduler] together.

use crate::{
    register::register_game_types,
    rpc::{l1_provider, RpcContractProvider, RpcGameFactory},
    submitter::RpcTxSubmitter,
    DiskManager, DriverConfig, GameTypeRegistry, Scheduler,
};
use anyhow::Result;
use async_trait::async_trait;
use balin_fault::providers::RollupNode;
use std::{future::Future, sync::Arc};

/// The [Driver] trait defines the interface for all driver loops that are ran by the `balin` binary.
#[async_trait]
pub trait Driver {
    /// Creates a new [Driver] with the given configuration.
    async fn try_new(config: DriverConfig) -> Result<Self>
    where
        Self: Sized;

    /// Starts the [Driver] loop. It runs until the process receives ctrl-c.
    async fn start(self) -> Result<()>;
}

/// The [ChallengerDriver] plays every discovered dispute game of a supported type.
pub struct ChallengerDriver {
    /// The configuration for the driver.
    pub config: DriverConfig,
    scheduler: Scheduler,
}

#[async_trait]
impl Driver for ChallengerDriver {
    async fn try_new(config: DriverConfig) -> Result<Self> {
        config.check()?;

        let provider = l1_provider(&config.l1_rpc)?;
        let contracts = Arc::new(RpcContractProvider::new(provider.clone(), config.sender));
        let discovery = Arc::new(RpcGameFactory::new(
            provider.clone(),
            config.factory,
            config.game_window,
        ));
        let submitter = Arc::new(RpcTxSubmitter::new(
            provider,
            config.sender,
            config.tx_receipt_timeout,
            config.tx_max_attempts,
        ));
        let outputs = Arc::new(RollupNode::try_new(&config.rollup_rpc)?);

        let mut registry = GameTypeRegistry::new();
        register_game_types(&mut registry, &config, contracts, outputs, submitter)?;

        tokio::fs::create_dir_all(&config.datadir).await?;
        let scheduler = Scheduler::new(
            config.scheduler_config(),
            discovery,
            registry,
            DiskManager::new(&config.datadir),
        );

        Ok(Self { config, scheduler })
    }

    async fn start(self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(target: "scheduler", "Failed to listen for ctrl-c: {}", e);
            }
        })
        .await
    }
}

impl ChallengerDriver {
    /// Runs the [Scheduler] until `shutdown` completes.
    pub async fn run_until(self, shutdown: impl Future<Output = ()> + Send) -> Result<()> {
        tracing::info!(target: "scheduler", "Playing games of factory {} from {}", self.config.factory, self.config.sender);
        self.scheduler.run(shutdown).await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{ConfigError, TraceType};

    #[tokio::test]
    async fn rejects_invalid_configs() {
        let config = DriverConfig {
            max_concurrency: 0,
            ..Default::default()
        };
        let err = match ChallengerDriver::try_new(config).await {
            Ok(_) => panic!("driver built from an invalid config"),
            Err(e) => e,
        };
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::ZeroConcurrency)
        );
    }

    #[tokio::test]
    async fn creates_the_data_directory() {
        let root = tempfile::tempdir().unwrap();
        let config = DriverConfig {
            datadir: root.path().join("data"),
            trace_types: vec![TraceType::Alphabet],
            ..Default::default()
        };

        let driver = ChallengerDriver::try_new(config).await.unwrap();
        assert!(root.path().join("data").is_dir());
        driver.run_until(async {}).await.unwrap();
    }
}
