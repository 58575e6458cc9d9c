//! Node registry.
//!
//! Tracks the fixed set of participating nodes, keyed by network address.
//! Ids are handed out 1..=N in registration order and never change.  The
//! registry also holds the per-round acknowledgement flags used for the
//! start and game-over handshakes.

use std::fmt;
use std::net::SocketAddr;

use thiserror::Error;

/// Identity assigned to a node at registration (1-based).
pub type NodeId = u8;

/// Per-round acknowledgement flag selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundFlag {
    StartAck,
    GameOverAck,
}

impl fmt::Display for RoundFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundFlag::StartAck => write!(f, "ACK START GAME"),
            RoundFlag::GameOverAck => write!(f, "ACK OVER"),
        }
    }
}

/// One registered remote participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub addr: SocketAddr,
    pub id: NodeId,
    /// Set at registration and never cleared.
    pub ready: bool,
    pub start_ack_received: bool,
    pub game_over_ack: bool,
}

impl Node {
    fn flag(&self, flag: RoundFlag) -> bool {
        match flag {
            RoundFlag::StartAck => self.start_ack_received,
            RoundFlag::GameOverAck => self.game_over_ack,
        }
    }

    fn flag_mut(&mut self, flag: RoundFlag) -> &mut bool {
        match flag {
            RoundFlag::StartAck => &mut self.start_ack_received,
            RoundFlag::GameOverAck => &mut self.game_over_ack,
        }
    }
}

/// Outcome of a successful [`NodeRegistry::register`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// First time this address was seen.
    New(NodeId),
    /// The address was already registered under this id.
    Existing(NodeId),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("registry full ({capacity} nodes); ignoring {addr}")]
    Full { capacity: usize, addr: SocketAddr },
}

/// Ordered, capacity-bounded set of nodes.
#[derive(Debug, Clone)]
pub struct NodeRegistry {
    nodes: Vec<Node>,
    capacity: usize,
}

impl NodeRegistry {
    /// Create an empty registry that accepts at most `capacity` nodes.
    ///
    /// Ids are a single byte on the wire, so `capacity` is clamped to 255.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(NodeId::MAX as usize);
        Self {
            nodes: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Register `addr`, or return its existing id if already known.
    pub fn register(&mut self, addr: SocketAddr) -> Result<Registration, RegistryError> {
        if let Some(id) = self.lookup_by_address(addr) {
            return Ok(Registration::Existing(id));
        }
        if self.is_full() {
            return Err(RegistryError::Full {
                capacity: self.capacity,
                addr,
            });
        }
        // capacity <= 255, so the next id always fits.
        let id = (self.nodes.len() + 1) as NodeId;
        self.nodes.push(Node {
            addr,
            id,
            ready: true,
            start_ack_received: false,
            game_over_ack: false,
        });
        Ok(Registration::New(id))
    }

    pub fn lookup_by_address(&self, addr: SocketAddr) -> Option<NodeId> {
        self.nodes.iter().find(|n| n.addr == addr).map(|n| n.id)
    }

    /// Set `flag` for the node at `addr`.  Returns the node's id, or `None`
    /// when the address is not registered.
    pub fn mark(&mut self, addr: SocketAddr, flag: RoundFlag) -> Option<NodeId> {
        let node = self.nodes.iter_mut().find(|n| n.addr == addr)?;
        *node.flag_mut(flag) = true;
        Some(node.id)
    }

    /// Whether the node at `addr` has `flag` set (`false` if unknown).
    pub fn has_flag(&self, addr: SocketAddr, flag: RoundFlag) -> bool {
        self.nodes.iter().any(|n| n.addr == addr && n.flag(flag))
    }

    /// `true` iff every registered node has `flag` set (vacuously true when
    /// no node is registered).
    pub fn all_acked(&self, flag: RoundFlag) -> bool {
        self.nodes.iter().all(|n| n.flag(flag))
    }

    /// Nodes that have not yet set `flag`, in registration order.
    pub fn pending(&self, flag: RoundFlag) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| !n.flag(flag))
    }

    /// Clear both per-round flags on every node.  `ready` and ids are kept.
    pub fn reset_round_flags(&mut self) {
        for node in &mut self.nodes {
            node.start_ack_received = false;
            node.game_over_ack = false;
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.nodes.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
