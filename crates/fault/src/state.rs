//! This module contains the in-memory represtentation of a [crate::FaultDisputeGame]'s state

use crate::{ChessClock, Clock, FaultDisputeGame, Gindex, Position};
use alloy_primitives::Address;
use anyhow::{bail, Result};
use balin_primitives::{Claim, DisputeGame, GameStatus};

/// The [ClaimData] struct holds the data associated with a claim within a
/// [crate::FaultDisputeGame]'s state on-chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimData {
    /// The index of the parent claim in the DAG, or `u32::MAX` for the root claim.
    pub parent_index: u32,
    /// Whether or not the claim has been countered.
    pub countered: bool,
    pub claimant: Address,
    pub value: Claim,
    pub position: Position,
    pub clock: Clock,
}

impl ClaimData {
    /// The parent index sentinel carried by the root claim.
    pub const ROOT_PARENT_INDEX: u32 = u32::MAX;

    /// Returns `true` if the claim is the root claim of the game.
    pub fn is_root(&self) -> bool {
        self.parent_index == Self::ROOT_PARENT_INDEX
    }
}

/// the [FaultDisputeState] struct holds the in-memory representation of a
/// [crate::FaultDisputeGame]'s state as well as its root claim and
/// local status.
#[derive(Debug, Clone)]
pub struct FaultDisputeState {
    /// The [FaultDisputeState] is modeled as a directed acyclical graph (DAG) of [ClaimData] structs pointing to
    /// their parents, all the way up to the root claim of the dispute game.
    state: Vec<ClaimData>,
    /// The root claim is the claim that commits to the entirety of the backend VM's trace. The outcome of the game
    /// determines if this claim is true or false.
    root_claim: Claim,
    /// The status of the dispute game.
    status: GameStatus,
    /// The depth at which the output bisection hands off to the execution trace bisection.
    pub split_depth: u8,
    /// The max depth of the position tree.
    pub max_depth: u8,
    /// The time the state was observed at and the time each side may spend, in seconds. Without it, every claim is
    /// counterable.
    clock: Option<(u64, u64)>,
}

impl FaultDisputeState {
    pub fn new(
        state: Vec<ClaimData>,
        root_claim: Claim,
        status: GameStatus,
        split_depth: u8,
        max_depth: u8,
    ) -> Self {
        Self {
            state,
            root_claim,
            status,
            split_depth,
            max_depth,
            clock: None,
        }
    }

    /// Observes the chess clocks at `now`, with `max_clock_duration` seconds for each side.
    pub fn with_clock(mut self, now: u64, max_clock_duration: u64) -> Self {
        self.clock = Some((now, max_clock_duration));
        self
    }

    /// Returns `true` if the claim at `claim_index` can no longer be countered because the countering side's clock
    /// has run out. The countering side's clock carries the duration of the claim's parent plus the time elapsed
    /// since the claim was made.
    pub fn clock_expired(&self, claim_index: usize) -> bool {
        let (Some((now, max_clock_duration)), Some(claim)) = (self.clock, self.state.get(claim_index))
        else {
            return false;
        };
        let inherited = if claim.is_root() {
            0
        } else {
            self.state
                .get(claim.parent_index as usize)
                .map_or(0, |parent| parent.clock.duration())
        };
        let elapsed = now.saturating_sub(claim.clock.timestamp());
        inherited.saturating_add(elapsed) > max_clock_duration
    }

    /// Builds a [FaultDisputeState] from the claims observed on-chain, checking that the DAG is well formed: the
    /// first claim is the root, every other claim sits one level beneath its parent and no claim is deeper than
    /// `max_depth`.
    pub fn try_from_claims(
        state: Vec<ClaimData>,
        status: GameStatus,
        split_depth: u8,
        max_depth: u8,
    ) -> Result<Self> {
        let Some(root) = state.first() else {
            bail!("Game has no root claim");
        };
        if !root.is_root() || root.position != 1 {
            bail!("First claim in the game is not the root claim");
        }

        for (index, claim) in state.iter().enumerate().skip(1) {
            let parent = state.get(claim.parent_index as usize).ok_or_else(|| {
                anyhow::anyhow!("Claim {index} references missing parent {}", claim.parent_index)
            })?;
            if claim.position.depth() != parent.position.depth() + 1 {
                bail!("Claim {index} is not one level beneath its parent");
            }
            if claim.position.depth() > max_depth {
                bail!("Claim {index} exceeds the maximum game depth");
            }
        }

        let root_claim = root.value;
        Ok(Self::new(state, root_claim, status, split_depth, max_depth))
    }

    /// Returns `true` if a claim with the given parent, position and value already exists in the DAG.
    pub fn is_duplicate(&self, parent_index: usize, position: Position, value: Claim) -> bool {
        self.state.iter().any(|c| {
            c.parent_index as usize == parent_index && c.position == position && c.value == value
        })
    }
}

impl DisputeGame for FaultDisputeState {
    fn root_claim(&self) -> Claim {
        self.root_claim
    }

    fn status(&self) -> &GameStatus {
        &self.status
    }
}

impl FaultDisputeGame for FaultDisputeState {
    fn state(&self) -> &[ClaimData] {
        &self.state
    }

    fn split_depth(&self) -> u8 {
        self.split_depth
    }

    fn max_depth(&self) -> u8 {
        self.max_depth
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn claim(parent_index: u32, position: Position, byte: u8) -> ClaimData {
        ClaimData {
            parent_index,
            countered: false,
            claimant: Address::ZERO,
            value: Claim::repeat_byte(byte),
            position,
            clock: 0,
        }
    }

    #[test]
    fn builds_state_from_well_formed_claims() {
        let claims = vec![claim(u32::MAX, 1, 1), claim(0, 2, 2), claim(1, 6, 3)];
        let state = FaultDisputeState::try_from_claims(claims, GameStatus::InProgress, 2, 4).unwrap();

        assert_eq!(state.root_claim(), Claim::repeat_byte(1));
        assert_eq!(state.state().len(), 3);
        assert!(state.is_duplicate(1, 6, Claim::repeat_byte(3)));
        assert!(!state.is_duplicate(1, 6, Claim::repeat_byte(4)));
        assert!(!state.is_duplicate(0, 6, Claim::repeat_byte(3)));
    }

    #[test]
    fn rejects_malformed_claims() {
        assert!(FaultDisputeState::try_from_claims(vec![], GameStatus::InProgress, 2, 4).is_err());
        assert!(FaultDisputeState::try_from_claims(
            vec![claim(0, 2, 1)],
            GameStatus::InProgress,
            2,
            4
        )
        .is_err());
        assert!(FaultDisputeState::try_from_claims(
            vec![claim(u32::MAX, 1, 1), claim(0, 4, 2)],
            GameStatus::InProgress,
            2,
            4
        )
        .is_err());
        assert!(FaultDisputeState::try_from_claims(
            vec![claim(u32::MAX, 1, 1), claim(7, 2, 2)],
            GameStatus::InProgress,
            2,
            4
        )
        .is_err());
        assert!(FaultDisputeState::try_from_claims(
            vec![claim(u32::MAX, 1, 1), claim(0, 2, 2)],
            GameStatus::InProgress,
            0,
            0
        )
        .is_err());
    }

    #[test]
    fn expired_clocks_block_counters() {
        // The root was made at t=100. Its child at t=160 spent 60 seconds of the challenger's clock.
        let root = ClaimData {
            clock: 100,
            ..claim(u32::MAX, 1, 1)
        };
        let child = ClaimData {
            clock: (60u128 << 64) | 160,
            ..claim(0, 2, 2)
        };
        let grandchild = ClaimData {
            clock: (50u128 << 64) | 200,
            ..claim(1, 4, 3)
        };
        let state = FaultDisputeState::try_from_claims(
            vec![root, child, grandchild],
            GameStatus::InProgress,
            2,
            4,
        )
        .unwrap();

        // Without observed clocks every claim is counterable.
        assert!(!state.clock_expired(0));
        assert!(!state.clock_expired(2));

        let state = state.with_clock(230, 100);
        // Countering the root starts from an empty clock: 130 seconds have passed.
        assert!(state.clock_expired(0));
        // Countering the child inherits the root's empty clock: 70 seconds have passed.
        assert!(!state.clock_expired(1));
        // Countering the grandchild inherits 60 seconds and adds 30.
        assert!(!state.clock_expired(2));
        let state = state.with_clock(241, 100);
        assert!(state.clock_expired(2));
        assert!(!state.clock_expired(7));
    }
}
