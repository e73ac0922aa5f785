//! This module contains the implementation of the [crate::TraceProvider] trait for calling out to `cannon` to fetch
//! state witnesses and proof values.

use crate::{
    Gindex, LocalInputs, Position, PrestateProvider, StepWitness, TraceOracle, TraceProvider,
    TraceProviderFactory,
};
use anyhow::Result;
use balin_primitives::Claim;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use tokio::sync::OnceCell;

/// The name of the file holding the absolute prestate witness.
const PRESTATE_FILE: &str = "prestate.json";
/// The name of the file holding the step at which the VM exited.
const LAST_STEP_FILE: &str = "last_step.json";

/// Distinguishes the temporary files of concurrent writers.
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// The [CannonTraceFactory] builds a [CannonTraceProvider] per execution subgame. Every subgame gets its own cache
/// directory beneath `dir`, keyed by the agreed and disputed block numbers.
pub struct CannonTraceFactory<O: TraceOracle + ?Sized> {
    oracle: Arc<O>,
    dir: PathBuf,
    /// The depth of a single execution subgame's position tree.
    pub depth: u8,
    prestate: Arc<OnceCell<StepWitness>>,
}

impl<O: TraceOracle + ?Sized> Clone for CannonTraceFactory<O> {
    fn clone(&self) -> Self {
        Self {
            oracle: Arc::clone(&self.oracle),
            dir: self.dir.clone(),
            depth: self.depth,
            prestate: Arc::clone(&self.prestate),
        }
    }
}

impl<O: TraceOracle + ?Sized> CannonTraceFactory<O> {
    pub fn new(oracle: Arc<O>, dir: impl Into<PathBuf>, depth: u8) -> Self {
        Self {
            oracle,
            dir: dir.into(),
            depth,
            prestate: Arc::new(OnceCell::new()),
        }
    }

    /// Returns the root of the cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the absolute prestate witness, loading it from disk or running the oracle on the first request.
    pub async fn prestate(&self) -> Result<&StepWitness> {
        self.prestate
            .get_or_try_init(|| async {
                let path = self.dir.join(PRESTATE_FILE);
                if let Some(witness) = read_json::<StepWitness>(&path).await {
                    return Ok::<_, anyhow::Error>(witness);
                }
                tracing::debug!(target: "cannon-trace", "Computing absolute prestate in {}", self.dir.display());
                let witness = self.oracle.prestate().await?;
                write_json(&path, &witness).await?;
                Ok(witness)
            })
            .await
    }
}

#[async_trait::async_trait]
impl<O: TraceOracle + ?Sized> PrestateProvider for CannonTraceFactory<O> {
    async fn absolute_prestate_hash(&self) -> Result<Claim> {
        Ok(self.prestate().await?.state_hash)
    }
}

#[async_trait::async_trait]
impl<O: TraceOracle + ?Sized> TraceProviderFactory for CannonTraceFactory<O> {
    type Provider = CannonTraceProvider<O>;

    async fn provider_for(&self, inputs: LocalInputs) -> Result<Self::Provider> {
        let dir = self.dir.join(format!(
            "{}-{}",
            inputs.agreed_block_number, inputs.disputed_block_number
        ));
        // The cache root is never recreated, so a released game directory stays deleted.
        match tokio::fs::create_dir(&dir).await {
            Err(e) if e.kind() != ErrorKind::AlreadyExists => return Err(e.into()),
            _ => {}
        }
        Ok(CannonTraceProvider {
            factory: self.clone(),
            inputs,
            dir,
        })
    }
}

/// The [CannonTraceProvider] is a [TraceProvider] that runs `cannon` to retrieve state witnesses and proof values for
/// a single execution subgame.
///
/// Witnesses are cached on disk as `<step>.json`. Once the VM is observed to exit, the exit step is persisted and all
/// later trace indices are served from it.
pub struct CannonTraceProvider<O: TraceOracle + ?Sized> {
    factory: CannonTraceFactory<O>,
    pub inputs: LocalInputs,
    dir: PathBuf,
}

impl<O: TraceOracle + ?Sized> CannonTraceProvider<O> {
    /// Returns the cache directory of the subgame.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the witness after executing the instruction at `trace_index`.
    pub async fn witness_at(&self, trace_index: u64) -> Result<StepWitness> {
        let step = match read_json::<u64>(&self.dir.join(LAST_STEP_FILE)).await {
            Some(last_step) => trace_index.min(last_step),
            None => trace_index,
        };

        if let Some(witness) = read_json::<StepWitness>(&self.step_path(step)).await {
            return Ok(witness);
        }

        tracing::debug!(
            target: "cannon-trace",
            "Running program for blocks {}-{} to step {}",
            self.inputs.agreed_block_number,
            self.inputs.disputed_block_number,
            step
        );
        let witness = self.factory.oracle.step_at(&self.inputs, step).await?;
        write_json(&self.step_path(witness.step), &witness).await?;
        if witness.exited {
            tracing::debug!(target: "cannon-trace", "Program exited at step {}", witness.step);
            write_json(&self.dir.join(LAST_STEP_FILE), &witness.step).await?;
        }
        Ok(witness)
    }

    fn step_path(&self, step: u64) -> PathBuf {
        self.dir.join(format!("{step}.json"))
    }
}

#[async_trait::async_trait]
impl<O: TraceOracle + ?Sized> TraceProvider for CannonTraceProvider<O> {
    async fn absolute_prestate(&self, _: Position) -> Result<Arc<[u8]>> {
        Ok(self.factory.prestate().await?.state.to_vec().into())
    }

    async fn absolute_prestate_hash(&self, _: Position) -> Result<Claim> {
        Ok(self.factory.prestate().await?.state_hash)
    }

    async fn state_at(&self, position: Position) -> Result<Arc<[u8]>> {
        let witness = self
            .witness_at(position.trace_index(self.factory.depth))
            .await?;
        Ok(witness.state.to_vec().into())
    }

    async fn state_hash(&self, position: Position) -> Result<Claim> {
        let witness = self
            .witness_at(position.trace_index(self.factory.depth))
            .await?;
        Ok(witness.state_hash)
    }

    /// Returns the proof needed to execute the instruction that produces the state at `position`, which is carried
    /// by the witness one step before it.
    async fn proof_at(&self, position: Position) -> Result<Arc<[u8]>> {
        let proof = match position.trace_index(self.factory.depth) {
            0 => self.factory.prestate().await?.proof.clone(),
            trace_index => self.witness_at(trace_index - 1).await?.proof,
        };
        Ok(proof.to_vec().into())
    }
}

/// Reads a JSON file. Missing or unreadable files are treated as absent.
async fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let bytes = tokio::fs::read(path).await.ok()?;
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(target: "cannon-trace", "Discarding corrupt cache file {}: {}", path.display(), e);
            None
        }
    }
}

/// Writes a JSON file through a temporary file so that readers never observe a partial write.
async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let tmp = path.with_extension(format!(
        "{}.tmp",
        TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    tokio::fs::write(&tmp, serde_json::to_vec(value)?).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
