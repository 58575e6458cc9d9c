//! Coordinator loop.
//!
//! Owns the socket and all coordinator state.  [`Coordinator::run`] blocks
//! on registrations until `max_nodes` nodes have said "Node Ready", plays
//! `round_count` rounds strictly one after another, and returns a
//! [`Report`] built from the recorded results.
//!
//! Every await point is a socket operation or a timeout, so dropping the
//! `run` future cancels the run cleanly.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tokio::time::{timeout_at, Instant};

use crate::config::{ConfigError, CoordinatorConfig};
use crate::protocol::{outbound, Inbound};
use crate::registry::{Registration, RegistryError};
use crate::results::{PatternStats, RoundResult};
use crate::round::{self, RoundError};
use crate::socket::{Socket, SocketError};
use crate::state::CoordinatorState;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Socket(#[from] SocketError),
    #[error("registration timed out with {registered} of {expected} node(s)")]
    RegistrationTimeout { registered: usize, expected: usize },
    #[error("round {round} failed: {source}")]
    Round {
        round: u32,
        #[source]
        source: RoundError,
    },
}

pub struct Coordinator {
    socket: Socket,
    config: CoordinatorConfig,
    state: CoordinatorState,
    rng: StdRng,
}

impl Coordinator {
    /// Validate `config` and bind the shared socket.
    pub async fn bind(config: CoordinatorConfig) -> Result<Self, CoordinatorError> {
        config.validate()?;
        let socket = Socket::bind_with_order(config.bind_addr, config.byte_order).await?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        log::info!("[coordinator] listening on {}", socket.local_addr);
        Ok(Self {
            state: CoordinatorState::new(config.max_nodes),
            socket,
            config,
            rng,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.socket.local_addr
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn state(&self) -> &CoordinatorState {
        &self.state
    }

    /// Register nodes, play every round, and report.
    pub async fn run(&mut self) -> Result<Report, CoordinatorError> {
        self.register_nodes().await?;
        self.play_rounds().await?;
        Ok(self.report())
    }

    /// Block until the registry is full.
    pub async fn register_nodes(&mut self) -> Result<(), CoordinatorError> {
        let deadline = registration_deadline(self.config.registration_timeout);

        while !self.state.registry.is_full() {
            let received = match deadline {
                Some(deadline) => timeout_at(deadline, self.socket.recv_from())
                    .await
                    .map_err(|_| CoordinatorError::RegistrationTimeout {
                        registered: self.state.registry.len(),
                        expected: self.config.max_nodes,
                    })?,
                None => self.socket.recv_from().await,
            };

            let (msg, from) = match received {
                Ok(received) => received,
                Err(SocketError::Decode { from, source }) => {
                    log::debug!("[registry] discarding malformed datagram from {from}: {source}");
                    continue;
                }
                Err(e) => {
                    log::warn!("[registry] receive failed: {e}");
                    continue;
                }
            };

            match Inbound::classify(&msg) {
                Inbound::NodeReady => self.accept_registration(from).await,
                other => log::debug!("[registry] ignoring {other:?} from {from} before registration completes"),
            }
        }

        log::info!(
            "[registry] all {} node(s) registered; starting the game loop",
            self.state.registry.len()
        );
        Ok(())
    }

    async fn accept_registration(&mut self, from: SocketAddr) {
        let id = match self.state.registry.register(from) {
            Ok(Registration::New(id)) => {
                log::info!("[registry] Node Ready received from {from} (Node ID: {id})");
                id
            }
            Ok(Registration::Existing(id)) => {
                log::debug!("[registry] duplicate Node Ready from {from}; re-sending ACK");
                id
            }
            Err(e @ RegistryError::Full { .. }) => {
                log::warn!("[registry] {e}");
                return;
            }
        };
        if let Err(e) = self.socket.send_to(&outbound::registration_ack(id), from).await {
            log::warn!("[registry] sending ACK to Node {id} failed: {e}");
        }
    }

    /// Play the configured number of rounds sequentially.  Stops at the
    /// first failed round.
    pub async fn play_rounds(&mut self) -> Result<(), CoordinatorError> {
        for round in 1..=self.config.round_count {
            log::info!("--- GAME ROUND {round} ---");
            let result = round::play_round(&self.socket, &self.config, &mut self.state, &mut self.rng)
                .await
                .map_err(|source| CoordinatorError::Round { round, source })?;
            log::info!("[coordinator] round {round}: {result}");
        }
        log::info!("[coordinator] all game rounds completed");
        Ok(())
    }

    /// Summary of the rounds recorded so far.
    pub fn report(&self) -> Report {
        Report::new(self.state.results.results(), self.config.round_count)
    }
}

/// Instant registration gives up at.  A timeout too large to represent
/// means no deadline.
fn registration_deadline(timeout: Option<Duration>) -> Option<Instant> {
    timeout.and_then(|t| Instant::now().checked_add(t))
}

/// Final results: the chronological round list and per-pattern statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub rounds_configured: u32,
    pub results: Vec<RoundResult>,
    pub stats: Vec<PatternStats>,
}

impl Report {
    pub fn new(results: &[RoundResult], rounds_configured: u32) -> Self {
        Self {
            rounds_configured,
            results: results.to_vec(),
            stats: crate::results::pattern_stats(results, rounds_configured),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== FINAL GAME RESULTS ===")?;
        writeln!(
            f,
            "{} of {} round(s) completed",
            self.results.len(),
            self.rounds_configured
        )?;
        for (i, result) in self.results.iter().enumerate() {
            writeln!(f, " Round {}: {result}", i + 1)?;
        }
        writeln!(f)?;
        write!(f, "Pattern Statistics:")?;
        for stats in &self.stats {
            write!(f, "\n{stats}")?;
        }
        Ok(())
    }
}
