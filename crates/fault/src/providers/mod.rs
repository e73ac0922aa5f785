//! This modules contains trace providers for the variants of the [crate::FaultDisputeGame].

mod alphabet;
pub use self::alphabet::{AlphabetTraceFactory, AlphabetTraceProvider};

mod cannon;
pub use self::cannon::{CannonTraceFactory, CannonTraceProvider};

mod output;
pub use self::output::{OutputAtBlockResponse, OutputTraceProvider, RollupNode};

mod split;
pub use self::split::SplitTraceProvider;

pub mod mocks;
