//! The `config` module contains the [DriverConfig].

use crate::ConfigError;
use alloy_primitives::Address;
use balin_primitives::GameType;
use std::{fmt, path::PathBuf, str::FromStr, time::Duration};

/// The execution trace backends that the agent can play games with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceType {
    /// Cannon, run as an external process.
    Cannon,
    /// The mock Alphabet VM.
    Alphabet,
}

impl TraceType {
    /// Returns the [GameType] that games played with this trace type are created with.
    pub fn game_type(&self) -> GameType {
        match self {
            TraceType::Cannon => GameType::CANNON,
            TraceType::Alphabet => GameType::ALPHABET,
        }
    }
}

impl FromStr for TraceType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cannon" => Ok(TraceType::Cannon),
            "alphabet" => Ok(TraceType::Alphabet),
            other => Err(ConfigError::UnknownTraceType(other.to_string())),
        }
    }
}

impl fmt::Display for TraceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceType::Cannon => f.write_str("cannon"),
            TraceType::Alphabet => f.write_str("alphabet"),
        }
    }
}

/// The [DriverConfig] struct contains the configuration for the [crate::ChallengerDriver].
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// The L1 RPC endpoint used to read games and send transactions.
    pub l1_rpc: String,
    /// The trusted rollup node endpoint. The agent treats its output roots as the source of truth for the L2 chain.
    pub rollup_rpc: String,
    /// The address of the dispute game factory contract.
    pub factory: Address,
    /// The account that transactions are sent from. Signing is left to the L1 endpoint.
    pub sender: Address,
    /// The root of the per-game working directories.
    pub datadir: PathBuf,
    /// The trace types that games are played with.
    pub trace_types: Vec<TraceType>,
    /// The cannon executable, required when [TraceType::Cannon] is enabled.
    pub cannon_bin: Option<PathBuf>,
    /// Extra arguments passed to every cannon invocation.
    pub cannon_args: Vec<String>,
    /// The absolute prestate of the Alphabet VM.
    pub alphabet_prestate: u64,
    pub poll_interval: Duration,
    /// Ticks running longer than this are cancelled and retried on the next poll.
    pub tick_deadline: Duration,
    /// The maximum number of games progressed at once.
    pub max_concurrency: usize,
    /// Only games created within this window are played.
    pub game_window: Duration,
    /// The number of consecutive transient failures after which a game is given up on. `None` retries forever.
    pub max_consecutive_failures: Option<u32>,
    pub tx_receipt_timeout: Duration,
    pub tx_max_attempts: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            l1_rpc: "http://localhost:8545".to_string(),
            rollup_rpc: "http://localhost:9545".to_string(),
            factory: Address::ZERO,
            sender: Address::ZERO,
            datadir: PathBuf::from("balin-data"),
            trace_types: vec![TraceType::Cannon],
            cannon_bin: None,
            cannon_args: Vec::new(),
            alphabet_prestate: 0,
            poll_interval: Duration::from_secs(12),
            tick_deadline: Duration::from_secs(60),
            max_concurrency: 4,
            game_window: Duration::from_secs(28 * 24 * 60 * 60),
            max_consecutive_failures: None,
            tx_receipt_timeout: Duration::from_secs(60),
            tx_max_attempts: 3,
        }
    }
}

impl DriverConfig {
    /// Checks the configuration for values that would keep the agent from ever making progress.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.tick_deadline.is_zero() {
            return Err(ConfigError::ZeroTickDeadline);
        }
        if self.trace_types.is_empty() {
            return Err(ConfigError::NoTraceTypes);
        }
        if self.trace_types.contains(&TraceType::Cannon) && self.cannon_bin.is_none() {
            return Err(ConfigError::MissingCannonBin);
        }
        if self.tx_max_attempts == 0 {
            return Err(ConfigError::ZeroTxAttempts);
        }
        Ok(())
    }

    /// Returns the part of the configuration that drives the [crate::Scheduler].
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            poll_interval: self.poll_interval,
            tick_deadline: self.tick_deadline,
            max_concurrency: self.max_concurrency,
        }
    }
}

/// The [SchedulerConfig] holds the cadence and bounds of the [crate::Scheduler] loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub poll_interval: Duration,
    pub tick_deadline: Duration,
    pub max_concurrency: usize,
}
