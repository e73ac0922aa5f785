//! The `disk` module hands out the per-game working directories.

use alloy_primitives::Address;
use anyhow::Result;
use std::{
    collections::HashSet,
    io::ErrorKind,
    path::{Path, PathBuf},
};

const GAME_DIR_PREFIX: &str = "game-";

/// The [DiskManager] owns the data directory. Every game gets its own directory beneath it, named after the game's
/// address.
#[derive(Debug, Clone)]
pub struct DiskManager {
    root: PathBuf,
}

impl DiskManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the working directory of the game at `address`.
    pub fn dir_for(&self, address: Address) -> PathBuf {
        self.root.join(format!("{GAME_DIR_PREFIX}{address}"))
    }

    /// Creates the working directory of the game at `address`, reusing whatever a previous run left in it. The
    /// directory is deleted when the returned [GameDir] is released or dropped.
    pub async fn acquire(&self, address: Address) -> Result<GameDir> {
        let path = self.dir_for(address);
        tokio::fs::create_dir_all(&path).await?;
        Ok(GameDir {
            path,
            released: false,
        })
    }

    /// Deletes the working directories of every game not in `keep`. Anything in the data directory that is not a game
    /// directory is left alone.
    pub async fn remove_all_except(&self, keep: &HashSet<Address>) -> Result<()> {
        let keep = keep
            .iter()
            .map(|address| self.dir_for(*address))
            .collect::<HashSet<_>>();

        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_game_dir = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(GAME_DIR_PREFIX));
            if !is_game_dir || keep.contains(&path) || !entry.file_type().await?.is_dir() {
                continue;
            }

            tracing::debug!(target: "scheduler", "Deleting stale game directory {}", path.display());
            match tokio::fs::remove_dir_all(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

/// A [GameDir] is the working directory of a single game. [GameDir::release] deletes it; a directory that is dropped
/// without being released is deleted on the blocking pool.
#[derive(Debug)]
pub struct GameDir {
    path: PathBuf,
    released: bool,
}

impl GameDir {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the directory.
    pub async fn release(mut self) {
        self.released = true;
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(target: "scheduler", "Failed to delete game directory {}: {}", self.path.display(), e)
            }
        }
    }
}

impl Drop for GameDir {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let path = std::mem::take(&mut self.path);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => drop(handle.spawn_blocking(move || remove_dir(&path))),
            Err(_) => remove_dir(&path),
        }
    }
}

fn remove_dir(path: &Path) {
    match std::fs::remove_dir_all(path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(target: "scheduler", "Failed to delete game directory {}: {}", path.display(), e)
        }
    }
}
