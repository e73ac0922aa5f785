//! Types related to the [crate::DisputeGame] trait.

use alloy_primitives::B256;
use anyhow::{bail, Error};
use std::{convert::TryFrom, fmt};

/// The [Claim] type is an alias to [B256], used to deliniate a claim hash from a regular hash.
pub type Claim = B256;

/// The [GameType] is the numeric tag that the dispute game factory assigns to each dispute game implementation.
/// Tags that the agent does not know how to play are representable as well, so that they can be reported and
/// skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameType(pub u8);

impl GameType {
    /// The [GameType::CANNON] variant is used to indicate that the dispute game is being played over a
    /// FaultDisputeGame with output bisection on top and the Cannon VM as its backend source of truth.
    pub const CANNON: Self = Self(0);
    /// The [GameType::ALPHABET] variant is used to indicate that the dispute game is being played over a
    /// FaultDisputeGame with output bisection on top and the mock Alphabet VM as its backend source of truth. This
    /// game is used for testing purposes.
    pub const ALPHABET: Self = Self(255);
}

impl From<u8> for GameType {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::CANNON => write!(f, "cannon ({})", self.0),
            Self::ALPHABET => write!(f, "alphabet ({})", self.0),
            Self(other) => write!(f, "unknown ({other})"),
        }
    }
}

/// The [GameStatus] enum is used to indicate the status of a dispute game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    /// The [GameStatus::InProgress] variant is used to indicate that the dispute game is still in progress.
    InProgress = 0,
    /// The [GameStatus::ChallengerWins] variant is used to indicate that the challenger of the root claim has won the
    /// dispute game.
    ChallengerWins = 1,
    /// The [GameStatus::DefenderWins] variant is used to indicate that the defender of the root claim has won the
    /// dispute game.
    DefenderWins = 2,
}

impl GameStatus {
    /// Returns `true` if the game has been settled on-chain.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, GameStatus::InProgress)
    }
}

impl TryFrom<u8> for GameStatus {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(GameStatus::InProgress),
            1 => Ok(GameStatus::ChallengerWins),
            2 => Ok(GameStatus::DefenderWins),
            _ => bail!("Invalid game status"),
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameStatus::InProgress => f.write_str("in progress"),
            GameStatus::ChallengerWins => f.write_str("challenger wins"),
            GameStatus::DefenderWins => f.write_str("defender wins"),
        }
    }
}
