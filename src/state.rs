//! Round finite-state-machine types and the coordinator's owned state.
//!
//! Transitions are driven by [`crate::round`]; this module only defines the
//! states and the data they guard.
//!
//! ```text
//!  AWAITING_START ──START GAME sent──▶ AWAITING_START_ACKS
//!        ▲                                    │ all ACK START GAME
//!        │ next round                         ▼
//!      RESET ◀── all ACK OVER ── AWAITING_GAME_OVER_ACKS ◀── BROADCASTING
//!                                                  PATTERN DETECTED
//! ```

use std::fmt;

use crate::registry::NodeRegistry;
use crate::results::ResultLog;

/// Where the current round is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundPhase {
    /// No round in progress; `START GAME` not yet sent.
    #[default]
    AwaitingStart,
    /// `START GAME` sent; collecting `ACK START GAME`.
    AwaitingStartAcks,
    /// Bits are being broadcast.
    Broadcasting,
    /// A pattern was reported; collecting `ACK OVER`.
    AwaitingGameOverAcks,
    /// Per-round state cleared.  Terminal for the round.
    Reset,
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoundPhase::AwaitingStart => "awaiting-start",
            RoundPhase::AwaitingStartAcks => "awaiting-start-acks",
            RoundPhase::Broadcasting => "broadcasting",
            RoundPhase::AwaitingGameOverAcks => "awaiting-game-over-acks",
            RoundPhase::Reset => "reset",
        };
        f.write_str(name)
    }
}

/// Mutable state of the round in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundState {
    pub phase: RoundPhase,
    /// A bit-broadcast loop is running.
    pub game_active: bool,
    /// Sequence number the next `BIT` will carry.  Wraps at `u16::MAX`.
    pub bit_sequence_counter: u16,
    /// Bits broadcast so far this round.  Does not wrap with the counter.
    pub bits_sent: u32,
}

impl RoundState {
    /// Enter `Broadcasting` with a fresh counter.
    pub fn begin_broadcast(&mut self) {
        self.phase = RoundPhase::Broadcasting;
        self.game_active = true;
        self.bit_sequence_counter = 0;
        self.bits_sent = 0;
    }

    /// Account for one broadcast bit and return the sequence number it
    /// carried.
    pub fn advance(&mut self) -> u16 {
        let seq = self.bit_sequence_counter;
        self.bit_sequence_counter = self.bit_sequence_counter.wrapping_add(1);
        self.bits_sent += 1;
        seq
    }

    /// Clear everything a round leaves behind.
    pub fn reset(&mut self) {
        self.phase = RoundPhase::Reset;
        self.game_active = false;
        self.bit_sequence_counter = 0;
        self.bits_sent = 0;
    }
}

/// Everything the coordinator owns across rounds.
#[derive(Debug, Clone)]
pub struct CoordinatorState {
    pub registry: NodeRegistry,
    pub round: RoundState,
    pub results: ResultLog,
}

impl CoordinatorState {
    pub fn new(max_nodes: usize) -> Self {
        Self {
            registry: NodeRegistry::new(max_nodes),
            round: RoundState::default(),
            results: ResultLog::default(),
        }
    }

    /// Round teardown: clears the round state and every node's per-round
    /// flags.  Registrations and recorded results survive.
    pub fn reset_round(&mut self) {
        self.round.reset();
        self.registry.reset_round_flags();
        log::debug!("[round] state reset");
    }
}
