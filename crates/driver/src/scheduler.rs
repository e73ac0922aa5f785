//! The `scheduler` module contains the [Scheduler], the polling loop that keeps one [GamePlayer] per active game.

use crate::{
    disk::{DiskManager, GameDir},
    GameDiscovery, GameMetadata, GamePlayer, GameTypeRegistry, PlayerStatus, SchedulerConfig,
};
use alloy_primitives::Address;
use anyhow::Result;
use std::{
    collections::{HashMap, HashSet},
    future::Future,
    sync::Arc,
};
use tokio::{
    sync::{Mutex, Semaphore},
    task::JoinSet,
    time::MissedTickBehavior,
};

/// Why the [Scheduler] will not build a player for a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipReason {
    Unsupported,
    Failed,
    Resolved,
}

/// A live player along with the working directory it owns.
struct PlayerEntry {
    game: GameMetadata,
    player: Arc<Mutex<Box<dyn GamePlayer>>>,
    /// Released together with the player.
    dir: GameDir,
}

/// The [Scheduler] discovers games, builds players for them through the [GameTypeRegistry] and progresses every live
/// player once per tick.
///
/// A player is locked while it is being progressed, so it never runs two decision cycles at once. Different players
/// are progressed concurrently, up to `max_concurrency` at a time.
pub struct Scheduler {
    config: SchedulerConfig,
    discovery: Arc<dyn GameDiscovery>,
    registry: GameTypeRegistry,
    disk: DiskManager,
    players: HashMap<Address, PlayerEntry>,
    skipped: HashMap<Address, SkipReason>,
    permits: Arc<Semaphore>,
}

impl Scheduler {
    pub fn new(
        config: SchedulerConfig,
        discovery: Arc<dyn GameDiscovery>,
        registry: GameTypeRegistry,
        disk: DiskManager,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrency));
        Self {
            config,
            discovery,
            registry,
            disk,
            players: HashMap::new(),
            skipped: HashMap::new(),
            permits,
        }
    }

    /// Runs the polling loop until `shutdown` completes. A tick that outlives the tick deadline is cancelled and the
    /// work is picked up again on the next tick. On shutdown every player is dropped and its directory released.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> Result<()> {
        tokio::pin!(shutdown);
        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let game_types = self.registry.game_types().map(|t| t.to_string()).collect::<Vec<_>>();
        tracing::info!(target: "scheduler", "Starting scheduler in {} for game types [{}], polling every {:?}", self.disk.root().display(), game_types.join(", "), self.config.poll_interval);
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = interval.tick() => {}
            }

            let deadline = self.config.tick_deadline;
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                result = tokio::time::timeout(deadline, self.tick()) => match result {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => tracing::warn!(target: "scheduler", "Tick failed: {:#}", e),
                    Err(_) => tracing::warn!(target: "scheduler", "Tick cancelled after exceeding the {:?} deadline", deadline),
                },
            }
        }

        tracing::info!(target: "scheduler", "Shutting down, releasing {} players", self.players.len());
        for (_, entry) in self.players.drain() {
            entry.dir.release().await;
        }
        Ok(())
    }

    /// Runs a single discovery and progress cycle.
    async fn tick(&mut self) -> Result<()> {
        let games = self.discovery.games().await?;
        self.sync_players(&games).await;

        let results = self.progress_players().await;
        self.retire(results).await;
        Ok(())
    }

    /// Builds players for newly discovered games and forgets games that are no longer discoverable.
    async fn sync_players(&mut self, games: &[GameMetadata]) {
        let discovered = games.iter().map(|g| g.address).collect::<HashSet<_>>();
        self.skipped.retain(|address, _| discovered.contains(address));
        let gone = self
            .players
            .keys()
            .filter(|address| !discovered.contains(*address))
            .copied()
            .collect::<Vec<_>>();
        for address in gone {
            if let Some(entry) = self.players.remove(&address) {
                tracing::info!(target: "scheduler", "Game {} ({}) left the game window, dropping its player", address, entry.game.game_type);
                entry.dir.release().await;
            }
        }
        if let Err(e) = self.disk.remove_all_except(&discovered).await {
            tracing::warn!(target: "scheduler", "Failed to clean up stale game directories: {:#}", e);
        }

        for game in games {
            if self.players.contains_key(&game.address) || self.skipped.contains_key(&game.address)
            {
                continue;
            }

            let Some(creator) = self.registry.get(game.game_type) else {
                tracing::warn!(target: "scheduler", "Skipping game {} with unsupported game type {}", game.address, game.game_type);
                self.skipped.insert(game.address, SkipReason::Unsupported);
                continue;
            };

            let dir = match self.disk.acquire(game.address).await {
                Ok(dir) => dir,
                Err(e) => {
                    tracing::warn!(target: "scheduler", "Failed to create a directory for game {} ({}): {:#}", game.address, game.game_type, e);
                    continue;
                }
            };
            let created = creator.create(*game, dir.path()).await;
            match created {
                Ok(player) => {
                    tracing::info!(target: "scheduler", "Playing game {} ({})", game.address, game.game_type);
                    self.players.insert(
                        game.address,
                        PlayerEntry {
                            game: *game,
                            player: Arc::new(Mutex::new(player)),
                            dir,
                        },
                    );
                }
                Err(e) => {
                    tracing::warn!(target: "scheduler", "Failed to create a player for game {} ({}), retrying next tick: {:#}", game.address, game.game_type, e);
                    dir.release().await;
                }
            }
        }
    }

    /// Progresses every player that is not already being progressed and returns the status each one reached.
    async fn progress_players(&self) -> Vec<(Address, PlayerStatus)> {
        let mut tasks = JoinSet::new();
        for (address, entry) in self.players.iter() {
            let Ok(mut player) = entry.player.clone().try_lock_owned() else {
                tracing::debug!(target: "scheduler", "Game {} ({}) is still being progressed", address, entry.game.game_type);
                continue;
            };

            let permits = self.permits.clone();
            let address = *address;
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok()?;
                Some((address, player.progress().await))
            });
        }

        let mut results = Vec::with_capacity(tasks.len());
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(Some(status)) => results.push(status),
                Ok(None) => {}
                Err(e) => tracing::error!(target: "scheduler", "Progress task failed: {}", e),
            }
        }
        results
    }

    /// Drops the players that reached a terminal status, releasing their directories.
    async fn retire(&mut self, results: Vec<(Address, PlayerStatus)>) {
        for (address, status) in results {
            let reason = match status {
                PlayerStatus::Resolved(_) => SkipReason::Resolved,
                PlayerStatus::Failed => SkipReason::Failed,
                _ => continue,
            };
            if let Some(entry) = self.players.remove(&address) {
                tracing::info!(target: "scheduler", "Retiring game {} ({}): {}", address, entry.game.game_type, status);
                entry.dir.release().await;
            }
            self.skipped.insert(address, reason);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::{game, StaticDiscovery, StubCreator};
    use balin_primitives::{GameStatus, GameType};
    use std::{sync::atomic::Ordering, time::Duration};

    fn scheduler(
        creator: &Arc<StubCreator>,
        discovery: &Arc<StaticDiscovery>,
        root: &std::path::Path,
        max_concurrency: usize,
    ) -> Scheduler {
        let mut registry = GameTypeRegistry::new();
        registry
            .register(GameType::ALPHABET, creator.clone())
            .unwrap();
        Scheduler::new(
            SchedulerConfig {
                poll_interval: Duration::from_millis(10),
                tick_deadline: Duration::from_secs(5),
                max_concurrency,
            },
            discovery.clone(),
            registry,
            DiskManager::new(root),
        )
    }

    fn alphabet_games(n: u8) -> Vec<GameMetadata> {
        (1..=n).map(|i| game(i, GameType::ALPHABET)).collect()
    }

    #[tokio::test]
    async fn bounds_concurrent_progress() {
        let root = tempfile::tempdir().unwrap();
        let creator = Arc::new(StubCreator::new(
            PlayerStatus::Progressing,
            Duration::from_millis(20),
        ));
        let discovery = Arc::new(StaticDiscovery::new(alphabet_games(5)));
        let mut scheduler = scheduler(&creator, &discovery, root.path(), 2);

        scheduler.tick().await.unwrap();
        assert_eq!(creator.counters.created.load(Ordering::SeqCst), 5);
        assert_eq!(creator.counters.progressed.load(Ordering::SeqCst), 5);
        assert_eq!(creator.counters.peak.load(Ordering::SeqCst), 2);

        // Live players are progressed again rather than rebuilt.
        scheduler.tick().await.unwrap();
        assert_eq!(creator.counters.created.load(Ordering::SeqCst), 5);
        assert_eq!(creator.counters.progressed.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn never_overlaps_progress_of_one_player() {
        let root = tempfile::tempdir().unwrap();
        let creator = Arc::new(StubCreator::new(
            PlayerStatus::Progressing,
            Duration::from_millis(50),
        ));
        let discovery = Arc::new(StaticDiscovery::new(alphabet_games(1)));
        let mut scheduler = scheduler(&creator, &discovery, root.path(), 4);
        scheduler.sync_players(&alphabet_games(1)).await;

        let (first, second) = tokio::join!(scheduler.progress_players(), scheduler.progress_players());
        assert_eq!(first.len() + second.len(), 1);
        assert_eq!(creator.counters.progressed.load(Ordering::SeqCst), 1);
        assert_eq!(creator.counters.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn skips_unsupported_game_types_once() {
        let root = tempfile::tempdir().unwrap();
        let creator = Arc::new(StubCreator::new(PlayerStatus::Progressing, Duration::ZERO));
        let unsupported = game(7, GameType(7));
        let discovery = Arc::new(StaticDiscovery::new(vec![unsupported]));
        let mut scheduler = scheduler(&creator, &discovery, root.path(), 2);

        scheduler.tick().await.unwrap();
        scheduler.tick().await.unwrap();
        assert!(scheduler.players.is_empty());
        assert_eq!(
            scheduler.skipped.get(&unsupported.address),
            Some(&SkipReason::Unsupported)
        );
        assert!(creator.dirs.lock().unwrap().is_empty());
        assert!(!scheduler.disk.dir_for(unsupported.address).exists());
    }

    #[tokio::test]
    async fn failed_players_are_not_recreated() {
        let root = tempfile::tempdir().unwrap();
        let creator = Arc::new(StubCreator::new(PlayerStatus::Failed, Duration::ZERO));
        let discovery = Arc::new(StaticDiscovery::new(alphabet_games(1)));
        let mut scheduler = scheduler(&creator, &discovery, root.path(), 2);
        let address = alphabet_games(1)[0].address;

        scheduler.tick().await.unwrap();
        assert!(scheduler.players.is_empty());
        assert!(!scheduler.disk.dir_for(address).exists());

        scheduler.tick().await.unwrap();
        assert_eq!(creator.counters.created.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.skipped.get(&address), Some(&SkipReason::Failed));
    }

    #[tokio::test]
    async fn resolved_players_release_their_directory() {
        let root = tempfile::tempdir().unwrap();
        let creator = Arc::new(StubCreator::new(
            PlayerStatus::Resolved(GameStatus::DefenderWins),
            Duration::ZERO,
        ));
        let discovery = Arc::new(StaticDiscovery::new(alphabet_games(2)));
        let mut scheduler = scheduler(&creator, &discovery, root.path(), 2);

        scheduler.tick().await.unwrap();
        assert!(scheduler.players.is_empty());
        for game in alphabet_games(2) {
            assert!(!scheduler.disk.dir_for(game.address).exists());
            assert_eq!(
                scheduler.skipped.get(&game.address),
                Some(&SkipReason::Resolved)
            );
        }
    }

    #[tokio::test]
    async fn retries_construction_errors() {
        let root = tempfile::tempdir().unwrap();
        let creator = Arc::new(StubCreator::new(PlayerStatus::Progressing, Duration::ZERO));
        creator.fail.store(true, Ordering::SeqCst);
        let discovery = Arc::new(StaticDiscovery::new(alphabet_games(1)));
        let mut scheduler = scheduler(&creator, &discovery, root.path(), 2);
        let address = alphabet_games(1)[0].address;

        scheduler.tick().await.unwrap();
        assert!(scheduler.players.is_empty());
        assert!(scheduler.skipped.is_empty());
        assert!(!scheduler.disk.dir_for(address).exists());

        creator.fail.store(false, Ordering::SeqCst);
        scheduler.tick().await.unwrap();
        assert_eq!(creator.counters.created.load(Ordering::SeqCst), 1);
        assert!(scheduler.players.contains_key(&address));
        assert!(scheduler.disk.dir_for(address).is_dir());
        assert_eq!(creator.dirs.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn forgets_games_that_leave_discovery() {
        let root = tempfile::tempdir().unwrap();
        let creator = Arc::new(StubCreator::new(PlayerStatus::Progressing, Duration::ZERO));
        let unsupported = game(7, GameType(7));
        let mut games = alphabet_games(1);
        games.push(unsupported);
        let discovery = Arc::new(StaticDiscovery::new(games));
        let mut scheduler = scheduler(&creator, &discovery, root.path(), 2);
        let address = alphabet_games(1)[0].address;

        scheduler.tick().await.unwrap();
        assert_eq!(scheduler.players.len(), 1);
        assert_eq!(scheduler.skipped.len(), 1);

        discovery.set(vec![]);
        scheduler.tick().await.unwrap();
        assert!(scheduler.players.is_empty());
        assert!(scheduler.skipped.is_empty());
        assert!(!scheduler.disk.dir_for(address).exists());
    }

    #[tokio::test]
    async fn removes_directories_of_undiscovered_games() {
        let root = tempfile::tempdir().unwrap();
        let creator = Arc::new(StubCreator::new(PlayerStatus::Progressing, Duration::ZERO));
        let discovery = Arc::new(StaticDiscovery::new(alphabet_games(1)));
        let mut scheduler = scheduler(&creator, &discovery, root.path(), 2);
        let stale = scheduler.disk.dir_for(Address::repeat_byte(0x42));
        std::fs::create_dir_all(&stale).unwrap();

        scheduler.tick().await.unwrap();
        assert!(!stale.exists());
    }

    #[tokio::test]
    async fn shutdown_releases_directories() {
        let root = tempfile::tempdir().unwrap();
        let creator = Arc::new(StubCreator::new(
            PlayerStatus::Progressing,
            Duration::from_millis(5),
        ));
        let discovery = Arc::new(StaticDiscovery::new(alphabet_games(3)));
        let scheduler = scheduler(&creator, &discovery, root.path(), 2);

        scheduler
            .run(tokio::time::sleep(Duration::from_millis(200)))
            .await
            .unwrap();

        let dirs = creator.dirs.lock().unwrap().clone();
        assert_eq!(creator.counters.created.load(Ordering::SeqCst), 3);
        assert!(creator.counters.progressed.load(Ordering::SeqCst) >= 3);
        assert!(dirs.iter().all(|dir| !dir.exists()));
    }

    #[tokio::test]
    async fn cancels_ticks_past_the_deadline() {
        let root = tempfile::tempdir().unwrap();
        let creator = Arc::new(StubCreator::new(
            PlayerStatus::Progressing,
            Duration::from_secs(10),
        ));
        let discovery = Arc::new(StaticDiscovery::new(alphabet_games(1)));
        let mut scheduler = scheduler(&creator, &discovery, root.path(), 2);
        scheduler.config.tick_deadline = Duration::from_millis(20);

        scheduler
            .run(tokio::time::sleep(Duration::from_millis(200)))
            .await
            .unwrap();

        assert_eq!(creator.counters.created.load(Ordering::SeqCst), 1);
        assert_eq!(creator.counters.progressed.load(Ordering::SeqCst), 0);
    }
}
