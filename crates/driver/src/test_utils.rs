//! In-memory fakes of the chain capabilities and players, shared by the driver's tests.

use crate::{
    responder::resolve_tx, ContractProvider, GameContract, GameDiscovery, GameMetadata, GamePlayer, PlayerCreator,
    PlayerStatus, TxCandidate, TxReceipt, TxSubmitter,
};
use alloy_primitives::{Address, B256};
use anyhow::{bail, Result};
use balin_fault::ClaimData;
use balin_primitives::{Claim, GameStatus, GameType};
use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

/// The address of the game that the player tests play.
pub(crate) const GAME: Address = Address::repeat_byte(0xAA);

#[derive(Debug, Clone)]
struct FakeGameState {
    block_range: (u64, u64),
    split_depth: u8,
    max_depth: u8,
    max_clock_duration: u64,
    absolute_prestate: Claim,
    genesis_output_root: Claim,
    claims: Vec<ClaimData>,
    status: GameStatus,
    resolve_status: Option<GameStatus>,
    fail_reads: bool,
}

/// A [FakeGameContract] serves game state set by the test.
#[derive(Debug)]
pub(crate) struct FakeGameContract {
    state: Mutex<FakeGameState>,
}

impl Default for FakeGameContract {
    fn default() -> Self {
        Self {
            state: Mutex::new(FakeGameState {
                block_range: (100, 104),
                split_depth: 2,
                max_depth: 4,
                max_clock_duration: u64::MAX,
                absolute_prestate: Claim::ZERO,
                genesis_output_root: Claim::ZERO,
                claims: Vec::new(),
                status: GameStatus::InProgress,
                resolve_status: None,
                fail_reads: false,
            }),
        }
    }
}

impl FakeGameContract {
    pub(crate) fn set_absolute_prestate(&self, prestate: Claim) {
        self.state.lock().unwrap().absolute_prestate = prestate;
    }

    pub(crate) fn set_genesis_output_root(&self, root: Claim) {
        self.state.lock().unwrap().genesis_output_root = root;
    }

    pub(crate) fn set_depths(&self, split_depth: u8, max_depth: u8) {
        let mut state = self.state.lock().unwrap();
        state.split_depth = split_depth;
        state.max_depth = max_depth;
    }

    pub(crate) fn set_max_clock_duration(&self, duration: u64) {
        self.state.lock().unwrap().max_clock_duration = duration;
    }

    pub(crate) fn set_status(&self, status: GameStatus) {
        self.state.lock().unwrap().status = status;
    }

    /// Sets the status that a simulated `resolve()` settles with. `None` makes the simulation revert.
    pub(crate) fn set_resolve_status(&self, status: Option<GameStatus>) {
        self.state.lock().unwrap().resolve_status = status;
    }

    pub(crate) fn fail_reads(&self, fail: bool) {
        self.state.lock().unwrap().fail_reads = fail;
    }

    pub(crate) fn push_claim(&self, parent_index: u32, value: Claim, position: u128) {
        self.push_claim_at(parent_index, value, position, 0);
    }

    /// Pushes a claim whose packed chess clock is `clock`.
    pub(crate) fn push_claim_at(&self, parent_index: u32, value: Claim, position: u128, clock: u128) {
        self.state.lock().unwrap().claims.push(ClaimData {
            parent_index,
            countered: false,
            claimant: Address::ZERO,
            value,
            position,
            clock,
        });
    }

    fn read(&self) -> Result<FakeGameState> {
        let state = self.state.lock().unwrap().clone();
        if state.fail_reads {
            bail!("connection reset");
        }
        Ok(state)
    }
}

#[async_trait::async_trait]
impl GameContract for FakeGameContract {
    async fn block_range(&self) -> Result<(u64, u64)> {
        Ok(self.read()?.block_range)
    }

    async fn split_depth(&self) -> Result<u8> {
        Ok(self.read()?.split_depth)
    }

    async fn max_depth(&self) -> Result<u8> {
        Ok(self.read()?.max_depth)
    }

    async fn max_clock_duration(&self) -> Result<u64> {
        Ok(self.read()?.max_clock_duration)
    }

    async fn absolute_prestate(&self) -> Result<Claim> {
        Ok(self.read()?.absolute_prestate)
    }

    async fn genesis_output_root(&self) -> Result<Claim> {
        Ok(self.read()?.genesis_output_root)
    }

    async fn claims(&self) -> Result<Vec<ClaimData>> {
        Ok(self.read()?.claims)
    }

    async fn status(&self) -> Result<GameStatus> {
        Ok(self.read()?.status)
    }

    async fn call_resolve(&self) -> Result<GameStatus> {
        match self.read()?.resolve_status {
            Some(status) => Ok(status),
            None => bail!("execution reverted"),
        }
    }
}

/// A [FakeContracts] hands out the same [FakeGameContract] for every address.
#[derive(Debug, Default)]
pub(crate) struct FakeContracts(pub(crate) Arc<FakeGameContract>);

impl ContractProvider for FakeContracts {
    fn contract(&self, _: Address) -> Arc<dyn GameContract> {
        self.0.clone()
    }
}

/// A [RecordingSubmitter] records every transaction it is handed.
#[derive(Debug, Default)]
pub(crate) struct RecordingSubmitter {
    submitted: Mutex<Vec<TxCandidate>>,
    fail: AtomicBool,
    revert_moves: AtomicBool,
}

impl RecordingSubmitter {
    pub(crate) fn submitted(&self) -> Vec<TxCandidate> {
        self.submitted.lock().unwrap().clone()
    }

    pub(crate) fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Reverts every transaction other than `resolve()`.
    pub(crate) fn revert_moves(&self, revert: bool) {
        self.revert_moves.store(revert, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl TxSubmitter for RecordingSubmitter {
    async fn submit(&self, tx: TxCandidate) -> Result<TxReceipt> {
        if self.fail.load(Ordering::SeqCst) {
            bail!("transaction reverted");
        }
        if self.revert_moves.load(Ordering::SeqCst) && tx != resolve_tx(tx.to) {
            bail!("transaction reverted: clock expired");
        }
        self.submitted.lock().unwrap().push(tx);
        Ok(TxReceipt {
            tx_hash: B256::ZERO,
            block_number: 1,
            success: true,
        })
    }
}

/// A [StaticDiscovery] discovers whatever games the test last set.
#[derive(Debug, Default)]
pub(crate) struct StaticDiscovery(Mutex<Vec<GameMetadata>>);

impl StaticDiscovery {
    pub(crate) fn new(games: Vec<GameMetadata>) -> Self {
        Self(Mutex::new(games))
    }

    pub(crate) fn set(&self, games: Vec<GameMetadata>) {
        *self.0.lock().unwrap() = games;
    }
}

#[async_trait::async_trait]
impl GameDiscovery for StaticDiscovery {
    async fn games(&self) -> Result<Vec<GameMetadata>> {
        Ok(self.0.lock().unwrap().clone())
    }
}

pub(crate) fn game(byte: u8, game_type: GameType) -> GameMetadata {
    GameMetadata {
        address: Address::repeat_byte(byte),
        game_type,
        timestamp: 0,
    }
}

/// Counters shared by every [StubPlayer] built by one [StubCreator].
#[derive(Debug, Default)]
pub(crate) struct StubCounters {
    pub(crate) created: AtomicUsize,
    pub(crate) progressed: AtomicUsize,
    pub(crate) in_flight: AtomicUsize,
    pub(crate) peak: AtomicUsize,
}

/// A [StubPlayer] sleeps through every tick and then reports a fixed status.
pub(crate) struct StubPlayer {
    status: PlayerStatus,
    next: PlayerStatus,
    delay: Duration,
    counters: Arc<StubCounters>,
}

#[async_trait::async_trait]
impl GamePlayer for StubPlayer {
    async fn progress(&mut self) -> PlayerStatus {
        let in_flight = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(in_flight, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.counters.progressed.fetch_add(1, Ordering::SeqCst);

        self.status = self.next;
        self.status
    }

    fn status(&self) -> PlayerStatus {
        self.status
    }
}

/// A [StubCreator] builds [StubPlayer]s and records the directories they were handed.
pub(crate) struct StubCreator {
    pub(crate) next: Mutex<PlayerStatus>,
    pub(crate) delay: Duration,
    pub(crate) fail: AtomicBool,
    pub(crate) counters: Arc<StubCounters>,
    pub(crate) dirs: Mutex<Vec<PathBuf>>,
}

impl StubCreator {
    pub(crate) fn new(next: PlayerStatus, delay: Duration) -> Self {
        Self {
            next: Mutex::new(next),
            delay,
            fail: AtomicBool::new(false),
            counters: Arc::new(StubCounters::default()),
            dirs: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl PlayerCreator for StubCreator {
    async fn create(&self, _: GameMetadata, dir: &Path) -> Result<Box<dyn GamePlayer>> {
        self.dirs.lock().unwrap().push(dir.to_path_buf());
        if self.fail.load(Ordering::SeqCst) {
            bail!("contract not deployed yet");
        }
        self.counters.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubPlayer {
            status: PlayerStatus::Created,
            next: *self.next.lock().unwrap(),
            delay: self.delay,
            counters: self.counters.clone(),
        }))
    }
}
