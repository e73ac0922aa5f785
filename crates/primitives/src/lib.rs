//! Primitives for Balin, an agent that plays the OP Stack's dispute games.

mod dispute_game;
pub use dispute_game::{Claim, GameStatus, GameType};

mod traits;
pub use traits::{DisputeGame, DisputeSolver};
