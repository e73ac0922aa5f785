//! The driver crate runs the challenger agent: it discovers dispute games, plays each one with a [GamePlayer] and
//! submits the resulting moves.

mod config;
pub use config::{DriverConfig, SchedulerConfig, TraceType};

mod error;
pub use error::{ConfigError, RegistryError, ValidationError};

mod types;
pub use types::{GameMetadata, PlayerStatus, TxCandidate, TxReceipt};

mod traits;
pub use traits::{ContractProvider, GameContract, GameDiscovery, TxSubmitter};

/// Contains the smart contract bindings used by the driver.
pub mod bindings;

pub mod responder;

mod validator;
pub use validator::{PrestateKind, PrestateValidator, Validator};

mod player;
pub use player::{BoxedFaultSolver, FaultGamePlayer, GamePlayer};

mod registry;
pub use registry::{GameTypeRegistry, PlayerCreator};

mod register;
pub use register::{register_game_types, FaultPlayerCreator, TraceBackend};

mod disk;
pub use disk::{DiskManager, GameDir};

mod scheduler;
pub use scheduler::Scheduler;

mod oracle;
pub use oracle::ProcessTraceOracle;

mod rpc;
pub use rpc::{l1_provider, L1Provider, RpcContractProvider, RpcGameContract, RpcGameFactory};

mod submitter;
pub use submitter::RpcTxSubmitter;

mod driver;
pub use driver::{ChallengerDriver, Driver};

#[cfg(test)]
mod test_utils;
