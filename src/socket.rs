//! Async UDP socket abstraction.
//!
//! [`Socket`] is a thin wrapper around `tokio::net::UdpSocket` that speaks
//! [`crate::message::Message`] instead of raw bytes.  All protocol logic
//! lives elsewhere; this module owns only byte I/O.

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::UdpSocket;

use crate::message::{ByteOrder, DecodeError, Message, FRAME_LEN};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can arise from socket operations.
#[derive(Debug, Error)]
pub enum SocketError {
    /// Underlying I/O error from the OS.
    #[error("socket I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The received datagram could not be decoded.
    #[error("malformed datagram from {from}: {source}")]
    Decode {
        from: SocketAddr,
        #[source]
        source: DecodeError,
    },
}

// ---------------------------------------------------------------------------
// Socket
// ---------------------------------------------------------------------------

/// An async, message-oriented UDP socket.
///
/// All methods are `&self` so the socket can be shared across tasks if needed.
#[derive(Debug)]
pub struct Socket {
    /// Address this socket is bound to (filled in after OS assigns ephemeral port).
    pub local_addr: SocketAddr,
    order: ByteOrder,
    inner: UdpSocket,
}

impl Socket {
    /// Bind a new socket to `local_addr` using big-endian framing.
    ///
    /// Passing `0.0.0.0:0` lets the OS choose an ephemeral port.
    pub async fn bind(local_addr: SocketAddr) -> Result<Self, SocketError> {
        Self::bind_with_order(local_addr, ByteOrder::default()).await
    }

    pub async fn bind_with_order(
        local_addr: SocketAddr,
        order: ByteOrder,
    ) -> Result<Self, SocketError> {
        let inner = UdpSocket::bind(local_addr).await?;
        let local_addr = inner.local_addr()?;
        Ok(Self {
            local_addr,
            order,
            inner,
        })
    }

    /// Encode `message` and send it as a single UDP datagram to `dest`.
    pub async fn send_to(&self, message: &Message, dest: SocketAddr) -> Result<(), SocketError> {
        let bytes = message.encode(self.order);
        self.inner.send_to(&bytes, dest).await?;
        Ok(())
    }

    /// Receive the next datagram and decode it into a [`Message`].
    ///
    /// Returns `(message, sender_address)`.  Datagrams that fail to decode
    /// are returned as [`SocketError::Decode`]; the caller decides whether
    /// to keep listening.
    pub async fn recv_from(&self) -> Result<(Message, SocketAddr), SocketError> {
        let mut buf = [0u8; FRAME_LEN];
        let (n, from) = self.inner.recv_from(&mut buf).await?;
        let message =
            Message::decode(&buf[..n], self.order).map_err(|source| SocketError::Decode { from, source })?;
        Ok((message, from))
    }
}
