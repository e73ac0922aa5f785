//! This module contains implementations of the [crate::FaultClaimSolver] trait for various
//! solving methods and resolvers.

mod split;
pub use self::split::SplitClaimSolver;
