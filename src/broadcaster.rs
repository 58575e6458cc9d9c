//! Bit broadcaster.
//!
//! Streams one random symbol per tick to every node while the game is
//! active.  After each bit the broadcaster keeps reading until the socket has
//! been quiet for `bit_window`; that window is a pacing bound, not a
//! correctness requirement, since a detection report may arrive at any point
//! inside it.
//!
//! Sends are best-effort: a failed send to one node is logged and the
//! broadcast carries on with the remaining nodes and bits.

use rand::Rng;
use tokio::time::timeout;

use crate::config::CoordinatorConfig;
use crate::protocol::{outbound, Inbound, Symbol};
use crate::registry::RoundFlag;
use crate::results::RoundResult;
use crate::round::{collect_acks, reacknowledge_registration, RoundError};
use crate::socket::{Socket, SocketError};
use crate::state::CoordinatorState;

/// Broadcast bits until a registered node reports its pattern, record the
/// result, and run the game-over handshake.
///
/// `rolls_count` in the returned result is the number of bits sent this
/// round, including the one that triggered the report.
pub async fn broadcast_until_detection<R: Rng>(
    socket: &Socket,
    config: &CoordinatorConfig,
    state: &mut CoordinatorState,
    rng: &mut R,
) -> Result<RoundResult, RoundError> {
    if !state.round.game_active {
        return Err(RoundError::NotActive);
    }

    loop {
        let symbol = Symbol::toss(rng);
        send_bit(socket, state, symbol).await;

        if let Some(result) = poll_window(socket, config, state).await {
            state.results.record(result.clone());
            state.round.game_active = false;
            log::info!(
                "[bits] Node {} detected {} after {} roll(s)",
                result.node_id,
                result.pattern,
                result.rolls_count
            );

            collect_acks(socket, config, state, RoundFlag::GameOverAck).await?;
            log::info!("[bits] game over; stopped sending bits");
            return Ok(result);
        }
    }
}

/// Fan `symbol` out to every node under the current sequence number, then
/// advance the counter.
async fn send_bit(socket: &Socket, state: &mut CoordinatorState, symbol: Symbol) {
    let seq = state.round.bit_sequence_counter;
    for node in state.registry.nodes() {
        match socket.send_to(&outbound::bit(node.id, seq, symbol), node.addr).await {
            Ok(()) => log::debug!("[bits] → {symbol} seq={seq} to Node {} ({})", node.id, node.addr),
            Err(e) => log::warn!("[bits] sending bit seq={seq} to Node {} failed: {e}", node.id),
        }
    }
    state.round.advance();
}

/// Read until the socket is quiet for `bit_window`.  Returns the round
/// result as soon as a registered node reports a pattern.
async fn poll_window(
    socket: &Socket,
    config: &CoordinatorConfig,
    state: &CoordinatorState,
) -> Option<RoundResult> {
    loop {
        let (msg, from) = match timeout(config.bit_window, socket.recv_from()).await {
            Err(_elapsed) => return None,
            Ok(Ok(received)) => received,
            Ok(Err(SocketError::Decode { from, source })) => {
                log::debug!("[bits] discarding malformed datagram from {from}: {source}");
                continue;
            }
            Ok(Err(e)) => {
                log::warn!("[bits] receive failed: {e}");
                return None;
            }
        };

        match Inbound::classify(&msg) {
            Inbound::PatternDetected { pattern } => {
                let Some(node_id) = state.registry.lookup_by_address(from) else {
                    log::warn!("[bits] pattern report from unregistered address {from} ignored");
                    continue;
                };
                return Some(RoundResult {
                    node_id,
                    pattern,
                    rolls_count: state.round.bits_sent,
                });
            }
            Inbound::BitAck { index } => {
                log::debug!("[bits] bit ack from node {} ({from}) index={index:?}", msg.node_id);
            }
            Inbound::NodeReady => reacknowledge_registration(socket, state, from).await,
            other => log::debug!("[bits] discarding {other:?} from {from}"),
        }
    }
}
