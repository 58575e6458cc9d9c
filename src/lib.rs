//! `penney-coordinator` — the coordinator of a distributed Penney's ante
//! simulation over UDP.
//!
//! # Architecture
//!
//! ```text
//!  ┌──────────────────────────────────────┐
//!  │             Coordinator              │
//!  │  registration → N rounds → report    │
//!  └────┬─────────────────────────────────┘
//!       │ one round at a time
//!  ┌────▼──────────┐   bits   ┌───────────────┐
//!  │  round (FSM)  │─────────▶│  broadcaster  │
//!  └────┬──────────┘          └──────┬────────┘
//!       │ acks / reports             │
//!  ┌────▼────────────────────────────▼────────┐
//!  │  CoordinatorState                        │
//!  │  (registry + round counters + results)   │
//!  └────┬─────────────────────────────────────┘
//!       │ ALP frames
//!  ┌────▼──────┐
//!  │  Socket   │  (thin async wrapper around tokio UdpSocket)
//!  └───────────┘
//! ```
//!
//! Each module has a single responsibility:
//! - [`message`]      — ALP wire format (serialise / deserialise)
//! - [`protocol`]     — payload vocabulary and inbound classification
//! - [`socket`]       — async UDP socket speaking [`message::Message`]
//! - [`registry`]     — participating nodes and their per-round flags
//! - [`state`]        — round FSM types and the coordinator's owned state
//! - [`retry`]        — bounded back-off for acknowledgement waits
//! - [`round`]        — one round: start handshake → bits → reset
//! - [`broadcaster`]  — random bit stream and detection polling
//! - [`results`]      — round results and pattern statistics
//! - [`config`]       — coordinator settings
//! - [`coordinator`]  — registration and the round loop

pub mod broadcaster;
pub mod config;
pub mod coordinator;
pub mod message;
pub mod protocol;
pub mod registry;
pub mod results;
pub mod retry;
pub mod round;
pub mod socket;
pub mod state;

pub use config::CoordinatorConfig;
pub use coordinator::{Coordinator, CoordinatorError, Report};
pub use results::{PatternStats, RoundResult};
