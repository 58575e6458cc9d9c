//! Payload vocabulary of the ALP exchange.
//!
//! Inbound messages are classified exactly once, at the socket boundary,
//! into the closed [`Inbound`] enum; everything downstream dispatches with
//! `match` instead of comparing payload strings.

use std::fmt;

use rand::Rng;

use crate::message::{Message, MessageKind};

pub const NODE_READY: &str = "Node Ready";
pub const REGISTRATION_ACK: &str = "ACK";
pub const START_GAME: &str = "START GAME";
pub const ACK_START_GAME: &str = "ACK START GAME";
pub const ACK_BIT_PREFIX: &str = "ACK BIT";
pub const GAME_OVER: &str = "GAME OVER";
pub const ACK_OVER: &str = "ACK OVER";

/// One coin toss.  Nodes see it as the single character `O` or `R`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    /// Heads.
    O,
    /// Tails.
    R,
}

impl Symbol {
    /// Draw a fair toss.
    pub fn toss<R: Rng>(rng: &mut R) -> Self {
        if rng.random_bool(0.5) {
            Symbol::O
        } else {
            Symbol::R
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Symbol::O => 'O',
            Symbol::R => 'R',
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Meaning of a message received by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Registration request.
    NodeReady,
    StartAck,
    /// Informational per-bit acknowledgement; `index` is parsed from the
    /// payload suffix when present.
    BitAck { index: Option<u16> },
    GameOverAck,
    PatternDetected { pattern: String },
    /// Well-formed frame that means nothing to the coordinator.
    Unrecognized,
}

impl Inbound {
    pub fn classify(msg: &Message) -> Self {
        let payload = msg.payload.as_str();
        match msg.kind {
            MessageKind::Status | MessageKind::Ack if payload == NODE_READY => Inbound::NodeReady,
            MessageKind::Ack if payload == ACK_START_GAME => Inbound::StartAck,
            MessageKind::Ack if payload == ACK_OVER => Inbound::GameOverAck,
            MessageKind::Ack if payload.starts_with(ACK_BIT_PREFIX) => Inbound::BitAck {
                index: payload[ACK_BIT_PREFIX.len()..].trim().parse().ok(),
            },
            MessageKind::PatternDetected => Inbound::PatternDetected {
                pattern: payload.to_string(),
            },
            _ => Inbound::Unrecognized,
        }
    }
}

/// Outbound frames the coordinator sends.
pub mod outbound {
    use super::*;

    pub fn registration_ack(node_id: u8) -> Message {
        Message::new(MessageKind::Status, node_id, 0, REGISTRATION_ACK)
    }

    pub fn start_game(node_id: u8) -> Message {
        Message::new(MessageKind::StartGame, node_id, 0, START_GAME)
    }

    pub fn bit(node_id: u8, sequence_num: u16, symbol: Symbol) -> Message {
        Message::new(MessageKind::Bit, node_id, sequence_num, symbol.as_char().to_string())
    }

    pub fn game_over(node_id: u8) -> Message {
        Message::new(MessageKind::GameOver, node_id, 0, GAME_OVER)
    }
}
