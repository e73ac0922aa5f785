//! The fault crate contains the trace providers and claim solver for the OP Stack's FaultDisputeGame.

mod clock;
pub use clock::Clock;

mod state;
pub use state::{ClaimData, FaultDisputeState};

mod traits;
pub use traits::{
    ChessClock, FaultClaimSolver, FaultDisputeGame, Gindex, OutputSource, PrestateProvider, TraceOracle,
    TraceProvider, TraceProviderFactory,
};

mod types;
pub use types::{
    compute_gindex, FaultSolverResponse, LocalInputs, Position, StepWitness, VMStatus,
};

mod solver;
pub use solver::FaultDisputeSolver;

pub mod providers;
pub use providers::{OutputTraceProvider, SplitTraceProvider};

pub mod solvers;

pub mod prelude {
    pub use super::{
        providers::*, solvers::*, ChessClock, ClaimData, Clock, FaultClaimSolver, FaultDisputeGame,
        FaultDisputeSolver, FaultDisputeState, FaultSolverResponse, Gindex, LocalInputs,
        OutputSource, Position, PrestateProvider, StepWitness, TraceOracle, TraceProvider,
        TraceProviderFactory, VMStatus,
    };
}
