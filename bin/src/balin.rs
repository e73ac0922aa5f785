use alloy_primitives::Address;
use anyhow::{anyhow, Result};
use balin_driver::{ChallengerDriver, Driver, DriverConfig, TraceType};
use clap::{ArgAction, Parser};
use std::{path::PathBuf, time::Duration};
use tracing::Level;

/// Arguments for the `balin` binary.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Verbosity level (0-4)
    #[arg(long, short, help = "Verbosity level (0-4)", action = ArgAction::Count, env = "VERBOSITY")]
    v: u8,

    /// The L1 RPC endpoint used to read games and send transactions.
    #[arg(
        long,
        help = "The L1 RPC endpoint used to read games and send transactions.",
        env = "BALIN_L1_RPC"
    )]
    l1_rpc: String,

    /// The trusted rollup node RPC endpoint.
    #[arg(long, help = "The trusted rollup node RPC endpoint.", env = "BALIN_ROLLUP_RPC")]
    rollup_rpc: String,

    /// The address of the dispute game factory contract.
    #[arg(
        long,
        help = "The address of the dispute game factory contract.",
        env = "BALIN_DGF"
    )]
    factory: Address,

    /// The account that transactions are sent from.
    #[arg(
        long,
        help = "The account that transactions are sent from. Signing is left to the L1 endpoint.",
        env = "BALIN_SENDER"
    )]
    sender: Address,

    /// The directory that per-game working directories are created in.
    #[arg(long, help = "The directory that per-game working directories are created in.", env = "BALIN_DATADIR", default_value = "balin-data")]
    datadir: PathBuf,

    /// The trace types to play games with.
    #[arg(
        long,
        help = "The trace types to play games with (cannon, alphabet).",
        env = "BALIN_TRACE_TYPES",
        value_delimiter = ',',
        default_value = "cannon"
    )]
    trace_type: Vec<TraceType>,

    /// The cannon executable.
    #[arg(long, help = "The cannon executable.", env = "BALIN_CANNON_BIN")]
    cannon_bin: Option<PathBuf>,

    /// Extra arguments passed to every cannon invocation.
    #[arg(
        long,
        help = "Extra arguments passed to every cannon invocation.",
        env = "BALIN_CANNON_ARGS",
        value_delimiter = ' ',
        allow_hyphen_values = true
    )]
    cannon_args: Vec<String>,

    /// The absolute prestate of the Alphabet VM.
    #[arg(long, help = "The absolute prestate of the Alphabet VM.", env = "BALIN_ALPHABET_PRESTATE", default_value_t = 0)]
    alphabet_prestate: u64,

    /// Seconds between two polls of the game factory.
    #[arg(long, help = "Seconds between two polls of the game factory.", env = "BALIN_POLL_INTERVAL", default_value_t = 12)]
    poll_interval: u64,

    /// Seconds that a single tick may run before it is cancelled.
    #[arg(long, help = "Seconds that a single tick may run before it is cancelled.", env = "BALIN_TICK_DEADLINE", default_value_t = 60)]
    tick_deadline: u64,

    /// The maximum number of games progressed at once.
    #[arg(long, help = "The maximum number of games progressed at once.", env = "BALIN_MAX_CONCURRENCY", default_value_t = 4)]
    max_concurrency: usize,

    /// Only games created within this many seconds are played.
    #[arg(long, help = "Only games created within this many seconds are played.", env = "BALIN_GAME_WINDOW", default_value_t = 28 * 24 * 60 * 60)]
    game_window: u64,

    /// Give up on a game after this many consecutive failed ticks.
    #[arg(long, help = "Give up on a game after this many consecutive failed ticks.", env = "BALIN_MAX_CONSECUTIVE_FAILURES")]
    max_consecutive_failures: Option<u32>,

    /// Seconds to wait for a transaction receipt before resubmitting.
    #[arg(long, help = "Seconds to wait for a transaction receipt before resubmitting.", env = "BALIN_TX_RECEIPT_TIMEOUT", default_value_t = 60)]
    tx_receipt_timeout: u64,

    /// The number of times a transaction is submitted before giving up.
    #[arg(long, help = "The number of times a transaction is submitted before giving up.", env = "BALIN_TX_MAX_ATTEMPTS", default_value_t = 3)]
    tx_max_attempts: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse the command arguments
    let Args {
        v,
        l1_rpc,
        rollup_rpc,
        factory,
        sender,
        datadir,
        trace_type,
        cannon_bin,
        cannon_args,
        alphabet_prestate,
        poll_interval,
        tick_deadline,
        max_concurrency,
        game_window,
        max_consecutive_failures,
        tx_receipt_timeout,
        tx_max_attempts,
    } = Args::parse();

    // Initialize the tracing subscriber
    init_tracing_subscriber(v)?;

    // Create the driver config.
    let driver_config = DriverConfig {
        l1_rpc,
        rollup_rpc,
        factory,
        sender,
        datadir,
        trace_types: trace_type,
        cannon_bin,
        cannon_args,
        alphabet_prestate,
        poll_interval: Duration::from_secs(poll_interval),
        tick_deadline: Duration::from_secs(tick_deadline),
        max_concurrency,
        game_window: Duration::from_secs(game_window),
        max_consecutive_failures,
        tx_receipt_timeout: Duration::from_secs(tx_receipt_timeout),
        tx_max_attempts,
    };
    tracing::info!(target: "balin-cli", "Driver config created successfully.");

    // Create the driver.
    tracing::debug!(target: "balin-cli", "Creating driver for endpoint {}...", &driver_config.l1_rpc);
    let driver = ChallengerDriver::try_new(driver_config).await?;
    tracing::info!(target: "balin-cli", "Driver created successfully, playing games from {}", &driver.config.datadir.display());

    // Start the driver loop.
    driver.start().await?;
    tracing::info!(target: "balin-cli", "Shut down cleanly.");

    Ok(())
}

/// Initializes the tracing subscriber
///
/// # Arguments
/// * `verbosity_level` - The verbosity level (0-4)
///
/// # Returns
/// * `Result<()>` - Ok if successful, Err otherwise.
fn init_tracing_subscriber(verbosity_level: u8) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(match verbosity_level {
            0 => Level::ERROR,
            1 => Level::WARN,
            2 => Level::INFO,
            3 => Level::DEBUG,
            _ => Level::TRACE,
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber).map_err(|e| anyhow!(e))
}
