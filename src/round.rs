//! Round state machine.
//!
//! [`play_round`] drives one round from `AwaitingStart` to `Reset`:
//!
//! 1. `START GAME` to every node, then collect `ACK START GAME` from all.
//! 2. Hand over to [`crate::broadcaster`], which streams bits until a node
//!    reports its pattern and then runs the game-over handshake.
//! 3. Reset the per-round state.
//!
//! Both handshakes go through [`collect_acks`]: the phase message is re-sent
//! to the nodes that have not answered whenever a wait window expires, with
//! the window backing off per [`crate::retry::RetryPolicy`].  A node that
//! stays silent through every window fails the round with
//! [`RoundError::Unresponsive`].

use std::net::SocketAddr;

use rand::Rng;
use thiserror::Error;
use tokio::time::{timeout_at, Instant};

use crate::broadcaster;
use crate::config::CoordinatorConfig;
use crate::message::Message;
use crate::protocol::{outbound, Inbound};
use crate::registry::{NodeId, RoundFlag};
use crate::results::RoundResult;
use crate::socket::{Socket, SocketError};
use crate::state::{CoordinatorState, RoundPhase};

#[derive(Debug, Error)]
pub enum RoundError {
    #[error(transparent)]
    Socket(#[from] SocketError),
    #[error("node(s) {nodes:?} unresponsive in {phase} after {attempts} attempt(s)")]
    Unresponsive {
        phase: RoundPhase,
        nodes: Vec<NodeId>,
        attempts: u32,
    },
    #[error("bit broadcast requested while no game is active")]
    NotActive,
}

/// Play one complete round and return its result.
///
/// Per-round state is reset whether the round succeeds or fails.
pub async fn play_round<R: Rng>(
    socket: &Socket,
    config: &CoordinatorConfig,
    state: &mut CoordinatorState,
    rng: &mut R,
) -> Result<RoundResult, RoundError> {
    let outcome = drive(socket, config, state, rng).await;
    state.reset_round();
    outcome
}

async fn drive<R: Rng>(
    socket: &Socket,
    config: &CoordinatorConfig,
    state: &mut CoordinatorState,
    rng: &mut R,
) -> Result<RoundResult, RoundError> {
    collect_acks(socket, config, state, RoundFlag::StartAck).await?;

    log::info!("[round] all nodes acknowledged START GAME; sending bits");
    state.round.begin_broadcast();
    broadcaster::broadcast_until_detection(socket, config, state, rng).await
}

/// Send the phase message for `flag` and wait until every node has
/// acknowledged it.
pub async fn collect_acks(
    socket: &Socket,
    config: &CoordinatorConfig,
    state: &mut CoordinatorState,
    flag: RoundFlag,
) -> Result<(), RoundError> {
    state.round.phase = match flag {
        RoundFlag::StartAck => RoundPhase::AwaitingStartAcks,
        RoundFlag::GameOverAck => RoundPhase::AwaitingGameOverAcks,
    };
    let mut backoff = config.retry.backoff();

    send_phase_message(socket, state, flag).await;
    log::info!("[round] waiting for {flag} from all nodes");

    loop {
        let deadline = Instant::now() + backoff.timeout();

        while !state.registry.all_acked(flag) {
            match timeout_at(deadline, socket.recv_from()).await {
                Err(_elapsed) => break,
                Ok(Ok((msg, from))) => {
                    if on_handshake_message(socket, state, flag, msg, from).await {
                        backoff.reset();
                    }
                }
                Ok(Err(SocketError::Decode { from, source })) => {
                    log::debug!("[round] discarding malformed datagram from {from}: {source}");
                }
                Ok(Err(e)) => log::warn!("[round] receive failed: {e}"),
            }
        }

        if state.registry.all_acked(flag) {
            log::info!("[round] all nodes sent {flag}");
            return Ok(());
        }

        if !backoff.next_attempt() {
            let nodes: Vec<NodeId> = state.registry.pending(flag).map(|n| n.id).collect();
            log::error!("[round] giving up on {flag}; silent nodes {nodes:?}");
            return Err(RoundError::Unresponsive {
                phase: state.round.phase,
                nodes,
                attempts: backoff.attempt(),
            });
        }

        log::warn!(
            "[round] {flag} missing; re-sending (attempt {}, window {:?})",
            backoff.attempt(),
            backoff.timeout()
        );
        send_phase_message(socket, state, flag).await;
    }
}

/// Send the message that `flag` acknowledges to every node still missing it.
async fn send_phase_message(socket: &Socket, state: &CoordinatorState, flag: RoundFlag) {
    for node in state.registry.pending(flag) {
        let msg = match flag {
            RoundFlag::StartAck => outbound::start_game(node.id),
            RoundFlag::GameOverAck => outbound::game_over(node.id),
        };
        match socket.send_to(&msg, node.addr).await {
            Ok(()) => log::info!("[round] → {} to Node {} ({})", msg.payload, node.id, node.addr),
            Err(e) => log::warn!("[round] sending {} to Node {} failed: {e}", msg.payload, node.id),
        }
    }
}

/// Apply one message received during a handshake.  Returns `true` when it
/// set a flag that was not set before.
async fn on_handshake_message(
    socket: &Socket,
    state: &mut CoordinatorState,
    flag: RoundFlag,
    msg: Message,
    from: SocketAddr,
) -> bool {
    let wanted = match (Inbound::classify(&msg), flag) {
        (Inbound::StartAck, RoundFlag::StartAck) | (Inbound::GameOverAck, RoundFlag::GameOverAck) => true,
        (Inbound::NodeReady, _) => {
            reacknowledge_registration(socket, state, from).await;
            false
        }
        (Inbound::PatternDetected { pattern }, _) => {
            log::info!("[round] ignoring pattern {pattern:?} from {from} outside the bit stream");
            false
        }
        (other, _) => {
            log::debug!("[round] discarding {other:?} from {from} while waiting for {flag}");
            false
        }
    };
    if !wanted {
        return false;
    }

    let fresh = !state.registry.has_flag(from, flag);
    match state.registry.mark(from, flag) {
        Some(id) => {
            log::info!("[round] {flag} received from Node {id} ({from})");
            fresh
        }
        None => {
            log::warn!("[round] {flag} from unregistered address {from}");
            false
        }
    }
}

/// A registered node repeated "Node Ready": its ACK was probably lost.
pub(crate) async fn reacknowledge_registration(
    socket: &Socket,
    state: &CoordinatorState,
    from: SocketAddr,
) {
    let Some(id) = state.registry.lookup_by_address(from) else {
        log::debug!("[round] ignoring registration from {from} after registration closed");
        return;
    };
    if let Err(e) = socket.send_to(&outbound::registration_ack(id), from).await {
        log::warn!("[round] re-sending registration ACK to Node {id} failed: {e}");
    }
}
