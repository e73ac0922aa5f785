//! The `registry` module maps game types to the constructors of their players.

use crate::{GameMetadata, GamePlayer, RegistryError};
use anyhow::Result;
use balin_primitives::GameType;
use std::{collections::HashMap, path::Path, sync::Arc};

/// A [PlayerCreator] builds the [GamePlayer] for a game of the type it is registered under. The player owns `dir`
/// as its working directory.
#[async_trait::async_trait]
pub trait PlayerCreator: Send + Sync {
    async fn create(&self, game: GameMetadata, dir: &Path) -> Result<Box<dyn GamePlayer>>;
}

/// The [GameTypeRegistry] holds one [PlayerCreator] per supported [GameType]. It is filled once at startup.
#[derive(Default, Clone)]
pub struct GameTypeRegistry {
    creators: HashMap<GameType, Arc<dyn PlayerCreator>>,
}

impl GameTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `creator` for `game_type`. Registering a type twice is an error.
    pub fn register(
        &mut self,
        game_type: GameType,
        creator: Arc<dyn PlayerCreator>,
    ) -> Result<(), RegistryError> {
        if self.creators.contains_key(&game_type) {
            return Err(RegistryError::DuplicateGameType(game_type));
        }
        self.creators.insert(game_type, creator);
        Ok(())
    }

    /// Returns the [PlayerCreator] for `game_type`, if it is supported.
    pub fn get(&self, game_type: GameType) -> Option<Arc<dyn PlayerCreator>> {
        self.creators.get(&game_type).cloned()
    }

    /// Returns the supported game types.
    pub fn game_types(&self) -> impl Iterator<Item = GameType> + '_ {
        self.creators.keys().copied()
    }
}
