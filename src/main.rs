//! Entry point for `penney-coordinator`.
//!
//! Parses CLI arguments into a [`CoordinatorConfig`] and runs the
//! coordinator.  All protocol work is delegated to library modules;
//! `main.rs` owns only process setup (logging, signal handling, argument
//! parsing) and printing the final report.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use penney_coordinator::config::DEFAULT_PORT;
use penney_coordinator::message::ByteOrder;
use penney_coordinator::retry::RetryPolicy;
use penney_coordinator::{Coordinator, CoordinatorConfig};

/// Coordinator for a distributed Penney's ante simulation over UDP.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Local address to bind (e.g. 0.0.0.0:12345).
    #[arg(short, long, default_value_t = SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)))]
    bind: SocketAddr,

    /// Number of rounds to play.
    #[arg(short, long, default_value_t = 5)]
    rounds: u32,

    /// Number of nodes to wait for before the first round.
    #[arg(short, long, default_value_t = 2)]
    nodes: usize,

    /// Quiet period after each bit, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    bit_window_ms: u64,

    /// First acknowledgement wait window, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    ack_timeout_ms: u64,

    /// Longest acknowledgement wait window after back-off, in milliseconds.
    #[arg(long, default_value_t = 8000)]
    max_ack_timeout_ms: u64,

    /// Wait windows per handshake before a node is declared unresponsive.
    #[arg(long, default_value_t = 6)]
    ack_attempts: u32,

    /// Give up on registration after this many seconds (waits forever if unset).
    #[arg(long)]
    registration_timeout_secs: Option<u64>,

    /// Byte order of the 16-bit header fields (big or little).
    #[arg(long, default_value = "big")]
    byte_order: ByteOrder,

    /// Seed for a reproducible bit stream.
    #[arg(long)]
    seed: Option<u64>,
}

impl From<Cli> for CoordinatorConfig {
    fn from(cli: Cli) -> Self {
        CoordinatorConfig {
            bind_addr: cli.bind,
            round_count: cli.rounds,
            max_nodes: cli.nodes,
            bit_window: Duration::from_millis(cli.bit_window_ms),
            retry: RetryPolicy {
                initial_timeout: Duration::from_millis(cli.ack_timeout_ms),
                max_timeout: Duration::from_millis(cli.max_ack_timeout_ms),
                max_attempts: cli.ack_attempts,
            },
            registration_timeout: cli.registration_timeout_secs.map(Duration::from_secs),
            byte_order: cli.byte_order,
            seed: cli.seed,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Default to info; RUST_LOG overrides.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = CoordinatorConfig::from(Cli::parse());
    let mut coordinator = Coordinator::bind(config).await?;

    let outcome = tokio::select! {
        outcome = coordinator.run() => outcome.map(|_| ()),
        _ = tokio::signal::ctrl_c() => {
            log::warn!("interrupted; reporting completed rounds only");
            Ok(())
        }
    };

    println!("{}", coordinator.report());
    outcome?;
    Ok(())
}
