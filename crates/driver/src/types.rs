//! Types shared between the players, the registry and the scheduler.

use alloy_primitives::{Address, Bytes, B256};
use balin_primitives::{GameStatus, GameType};
use std::fmt;

/// The [GameMetadata] identifies a single dispute game discovered through the factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameMetadata {
    pub address: Address,
    pub game_type: GameType,
    /// The creation timestamp of the game, in seconds.
    pub timestamp: u64,
}

/// A [TxCandidate] is a call that the agent wants to land on L1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxCandidate {
    pub to: Address,
    pub data: Bytes,
}

/// A [TxReceipt] is the outcome of a landed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: B256,
    pub block_number: u64,
    pub success: bool,
}

/// The [PlayerStatus] enum tracks where a [crate::GamePlayer] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatus {
    /// The player has been built but has not looked at the game yet.
    Created,
    /// The player is checking the game's fixed parameters.
    Validating,
    /// The player is responding to claims.
    Progressing,
    /// The game has been settled on-chain. Terminal.
    Resolved(GameStatus),
    /// The player gave up on the game. Terminal.
    Failed,
}

impl PlayerStatus {
    /// Returns `true` if the player will never act on its game again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlayerStatus::Resolved(_) | PlayerStatus::Failed)
    }
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerStatus::Created => f.write_str("created"),
            PlayerStatus::Validating => f.write_str("validating"),
            PlayerStatus::Progressing => f.write_str("progressing"),
            PlayerStatus::Resolved(status) => write!(f, "resolved ({status})"),
            PlayerStatus::Failed => f.write_str("failed"),
        }
    }
}
