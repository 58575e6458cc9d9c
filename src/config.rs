//! Coordinator configuration.
//!
//! Every field has a compiled-in default; the binary overrides them from
//! command-line flags.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::message::ByteOrder;
use crate::retry::RetryPolicy;

/// Well-known port nodes send their registrations to.
pub const DEFAULT_PORT: u16 = 12345;

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Local address of the shared datagram socket.
    pub bind_addr: SocketAddr,
    /// Number of rounds to play.
    pub round_count: u32,
    /// Number of nodes to wait for before the first round.
    pub max_nodes: usize,
    /// Quiet period after each bit: the broadcaster keeps reading until no
    /// message arrives for this long, then sends the next bit.
    pub bit_window: Duration,
    /// Re-send policy for the start and game-over handshakes.
    pub retry: RetryPolicy,
    /// Give up waiting for registrations after this long (`None` waits
    /// forever).
    pub registration_timeout: Option<Duration>,
    pub byte_order: ByteOrder,
    /// Seed for the bit stream; `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            round_count: 5,
            max_nodes: 2,
            bit_window: Duration::from_secs(1),
            retry: RetryPolicy::default(),
            registration_timeout: None,
            byte_order: ByteOrder::Big,
            seed: None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_nodes must be between 1 and 255, got {0}")]
    NodeCount(usize),
    #[error("bit window must be non-zero")]
    ZeroBitWindow,
    #[error("retry policy needs at least one attempt, a non-zero timeout and a cap no shorter than it")]
    Retry,
}

impl CoordinatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_nodes == 0 || self.max_nodes > u8::MAX as usize {
            return Err(ConfigError::NodeCount(self.max_nodes));
        }
        if self.bit_window.is_zero() {
            return Err(ConfigError::ZeroBitWindow);
        }
        if self.retry.max_attempts == 0
            || self.retry.initial_timeout.is_zero()
            || self.retry.max_timeout < self.retry.initial_timeout
        {
            return Err(ConfigError::Retry);
        }
        Ok(())
    }
}
