//! Simulated player nodes for integration tests.
//!
//! Each [`SimNode`] owns a real loopback UDP socket and follows a
//! [`NodeScript`]: acknowledge `START GAME`, acknowledge every bit, report
//! the scripted pattern after a fixed number of bits, acknowledge
//! `GAME OVER`.  What the node saw is returned as a [`RoundLog`].

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use penney_coordinator::message::{ByteOrder, Message, MessageKind};
use penney_coordinator::protocol::{ACK_OVER, ACK_START_GAME, NODE_READY, REGISTRATION_ACK};
use penney_coordinator::retry::RetryPolicy;
use penney_coordinator::socket::Socket;
use penney_coordinator::{Coordinator, CoordinatorConfig, CoordinatorError, Report};
use tokio::task::JoinHandle;

/// How long a node waits for any single datagram before failing the test.
const NODE_RECV_TIMEOUT: Duration = Duration::from_secs(10);

/// Quiet period after which a node that stopped acknowledging `GAME OVER`
/// assumes the coordinator gave up on it.  Longer than any retry window in
/// [`test_config`].
const GAME_OVER_DRAIN: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Loopback configuration with short windows so tests finish quickly.
pub fn test_config(nodes: usize, rounds: u32) -> CoordinatorConfig {
    CoordinatorConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        round_count: rounds,
        max_nodes: nodes,
        bit_window: Duration::from_millis(300),
        retry: RetryPolicy {
            initial_timeout: Duration::from_millis(200),
            max_timeout: Duration::from_millis(400),
            max_attempts: 4,
        },
        registration_timeout: Some(Duration::from_secs(5)),
        byte_order: ByteOrder::Big,
        seed: Some(42),
    }
}

/// Bind a coordinator and run it in a background task.  Returns its address
/// and a handle yielding the coordinator back together with the outcome.
pub async fn spawn_coordinator(
    config: CoordinatorConfig,
) -> (
    SocketAddr,
    JoinHandle<(Coordinator, Result<Report, CoordinatorError>)>,
) {
    let mut coordinator = Coordinator::bind(config).await.expect("bind coordinator");
    let addr = coordinator.local_addr();
    let handle = tokio::spawn(async move {
        let outcome = coordinator.run().await;
        (coordinator, outcome)
    });
    (addr, handle)
}

/// Send "Node Ready" from `socket` and wait for the registration ACK.
/// Returns the id the coordinator assigned.
pub async fn send_ready(socket: &Socket, coordinator: SocketAddr) -> u8 {
    socket
        .send_to(&Message::new(MessageKind::Status, 0, 0, NODE_READY), coordinator)
        .await
        .expect("send Node Ready");
    loop {
        let (msg, _) = tokio::time::timeout(NODE_RECV_TIMEOUT, socket.recv_from())
            .await
            .expect("registration ACK timed out")
            .expect("registration recv");
        if msg.kind == MessageKind::Status && msg.payload == REGISTRATION_ACK {
            return msg.node_id;
        }
    }
}

// ---------------------------------------------------------------------------
// Simulated node
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct NodeScript {
    pub pattern: String,
    /// One entry per round: report `pattern` once this many bits have
    /// arrived, or never.
    pub detect_after: Vec<Option<usize>>,
    /// Drop the very first `START GAME` without acknowledging it.
    pub ignore_first_start: bool,
    /// Drop the very first `GAME OVER` without acknowledging it.
    pub ignore_first_game_over: bool,
    /// Never acknowledge `GAME OVER`; count the repeats until the
    /// coordinator stops sending them.
    pub never_ack_game_over: bool,
    /// Header `node_id` for the pattern report instead of the assigned id.
    pub report_as: Option<u8>,
    /// Repeat "Node Ready" on the first `START GAME` of every round.
    pub resend_ready_on_start: bool,
}

impl NodeScript {
    pub fn new(pattern: &str, detect_after: Vec<Option<usize>>) -> Self {
        Self {
            pattern: pattern.into(),
            detect_after,
            ..Self::default()
        }
    }
}

/// What a node observed during one round.
#[derive(Debug, Clone, Default)]
pub struct RoundLog {
    pub start_games: usize,
    pub bit_seqs: Vec<u16>,
    pub symbols: String,
    pub game_overs: usize,
    /// Registration ACKs received after registration.
    pub registration_acks: usize,
}

pub struct SimNode {
    pub socket: Socket,
    pub coordinator: SocketAddr,
    pub id: u8,
}

impl SimNode {
    pub async fn register(coordinator: SocketAddr) -> Self {
        Self::register_with_order(coordinator, ByteOrder::Big).await
    }

    pub async fn register_with_order(coordinator: SocketAddr, order: ByteOrder) -> Self {
        let socket = Socket::bind_with_order("127.0.0.1:0".parse().unwrap(), order)
            .await
            .expect("bind node socket");
        let id = send_ready(&socket, coordinator).await;
        Self {
            socket,
            coordinator,
            id,
        }
    }

    pub async fn send(&self, kind: MessageKind, payload: &str, seq: u16) {
        self.send_as(self.id, kind, payload, seq).await;
    }

    pub async fn send_as(&self, node_id: u8, kind: MessageKind, payload: &str, seq: u16) {
        self.socket
            .send_to(&Message::new(kind, node_id, seq, payload), self.coordinator)
            .await
            .expect("node send");
    }

    pub async fn recv(&self) -> Message {
        self.try_recv(NODE_RECV_TIMEOUT).await.expect("node recv timed out")
    }

    /// Next message, or `None` if nothing arrives within `wait`.
    pub async fn try_recv(&self, wait: Duration) -> Option<Message> {
        match tokio::time::timeout(wait, self.socket.recv_from()).await {
            Ok(Ok((msg, _))) => Some(msg),
            Ok(Err(e)) => panic!("node recv: {e}"),
            Err(_elapsed) => None,
        }
    }

    /// Play every scripted round and return what was seen.
    pub async fn play(self, script: NodeScript) -> Vec<RoundLog> {
        let mut logs = Vec::new();
        let mut start_ignored = false;
        let mut game_over_ignored = false;

        for detect in script.detect_after.iter().copied() {
            let mut log = RoundLog::default();
            let mut reported = false;

            loop {
                let msg = self.recv().await;
                match msg.kind {
                    MessageKind::StartGame => {
                        log.start_games += 1;
                        if script.ignore_first_start && !start_ignored {
                            start_ignored = true;
                            continue;
                        }
                        if script.resend_ready_on_start && log.start_games == 1 {
                            self.send(MessageKind::Status, NODE_READY, 0).await;
                        }
                        self.send(MessageKind::Ack, ACK_START_GAME, 0).await;
                    }
                    MessageKind::Status if msg.payload == REGISTRATION_ACK => {
                        log.registration_acks += 1;
                    }
                    MessageKind::Bit => {
                        log.bit_seqs.push(msg.sequence_num);
                        log.symbols.push_str(&msg.payload);
                        let ack = format!("ACK BIT {}", msg.sequence_num);
                        self.send(MessageKind::Ack, &ack, msg.sequence_num).await;
                        if !reported && detect == Some(log.bit_seqs.len()) {
                            reported = true;
                            let id = script.report_as.unwrap_or(self.id);
                            self.send_as(id, MessageKind::PatternDetected, &script.pattern, msg.sequence_num)
                                .await;
                        }
                    }
                    MessageKind::GameOver => {
                        log.game_overs += 1;
                        if script.never_ack_game_over {
                            self.drain_game_overs(&mut log).await;
                            break;
                        }
                        if script.ignore_first_game_over && !game_over_ignored {
                            game_over_ignored = true;
                            continue;
                        }
                        self.send(MessageKind::Ack, ACK_OVER, 0).await;
                        break;
                    }
                    _ => {}
                }
            }
            logs.push(log);
        }
        logs
    }

    async fn drain_game_overs(&self, log: &mut RoundLog) {
        while let Some(msg) = self.try_recv(GAME_OVER_DRAIN).await {
            if msg.kind == MessageKind::GameOver {
                log.game_overs += 1;
            }
        }
    }
}
