//! Turns solver responses into the calls that carry them out on-chain.

use crate::{bindings::IFaultDisputeGame, TxCandidate};
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use balin_fault::FaultSolverResponse;

/// Returns the transaction that plays `response` in the game at `game`, or `None` if the response is a skip.
pub fn response_tx(game: Address, response: &FaultSolverResponse) -> Option<TxCandidate> {
    let data = match response {
        FaultSolverResponse::Skip(_) => return None,
        FaultSolverResponse::Move(true, index, claim) => IFaultDisputeGame::attackCall {
            _parentIndex: U256::from(*index),
            _claim: *claim,
        }
        .abi_encode(),
        FaultSolverResponse::Move(false, index, claim) => IFaultDisputeGame::defendCall {
            _parentIndex: U256::from(*index),
            _claim: *claim,
        }
        .abi_encode(),
        FaultSolverResponse::Step(is_attack, index, prestate, proof) => {
            IFaultDisputeGame::stepCall {
                _claimIndex: U256::from(*index),
                _isAttack: *is_attack,
                _stateData: Bytes::copy_from_slice(prestate),
                _proof: Bytes::copy_from_slice(proof),
            }
            .abi_encode()
        }
    };
    Some(TxCandidate {
        to: game,
        data: data.into(),
    })
}

/// Returns the transaction that resolves the game at `game`.
pub fn resolve_tx(game: Address) -> TxCandidate {
    TxCandidate {
        to: game,
        data: IFaultDisputeGame::resolveCall {}.abi_encode().into(),
    }
}
