//! A single live connection's write-side state.
//!
//! The registry owns one [`ConnectionEntry`] per accepted socket. Its write
//! half is guarded by a lock so that the session handler's own responses and
//! other connections' relay fan-out can never interleave their bytes on the
//! wire.

use fanout_proto::{ClientId, InboundMessage, ProtocolError, codec};
use tokio::{
    io::AsyncWriteExt,
    net::tcp::OwnedWriteHalf,
    sync::Mutex,
};

/// Owns the write half of one client's socket, plus the id it was allocated
/// on accept.
///
/// Session handlers never store a back-pointer from this entry to the
/// registry that owns it — that would create a reference cycle for no
/// benefit, since every handler already knows its own id and holds its own
/// `Arc` clone of the registry.
pub struct ConnectionEntry {
    id: ClientId,
    write_half: Mutex<OwnedWriteHalf>,
}

impl ConnectionEntry {
    /// Wrap a freshly accepted socket's write half under this id.
    pub fn new(id: ClientId, write_half: OwnedWriteHalf) -> Self {
        Self { id, write_half: Mutex::new(write_half) }
    }

    /// This connection's allocated client id.
    #[must_use]
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Write an unsolicited inbound-message push to this connection.
    ///
    /// All three wire segments (sender id, length, body) are written while
    /// holding the write lock, so no other writer can interleave bytes in
    /// the middle of this frame.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Io`] if the write fails partway through.
    pub async fn push_inbound(&self, message: &InboundMessage) -> Result<(), ProtocolError> {
        let mut half = self.write_half.lock().await;
        message.write(&mut *half).await
    }

    /// Write a `who_am_i` response: this connection's own id, as a raw
    /// 8-byte little-endian `u64`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Io`] if the write fails.
    pub async fn respond_who_am_i(&self) -> Result<(), ProtocolError> {
        let mut half = self.write_half.lock().await;
        codec::write_u64(&mut *half, self.id).await
    }

    /// Write a `who_is_here` response: a u8-length-prefixed IdList blob.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::LengthTooLarge`] if `peers` doesn't fit in a
    /// single blob, or [`ProtocolError::Io`] if the write fails.
    pub async fn respond_who_is_here(&self, peers: &[ClientId]) -> Result<(), ProtocolError> {
        let blob = fanout_proto::id_list::encode(peers)?;
        let mut half = self.write_half.lock().await;
        codec::write_blob(&mut *half, &blob).await
    }

    /// Shut down the write half, signalling EOF to the peer.
    ///
    /// Used by [`crate::server::Server::stop`] to close every connection on
    /// shutdown. The read side of the socket, owned by the session task, is
    /// left to notice the peer going away and exit its read loop on its own.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the shutdown fails.
    pub async fn shutdown(&self) -> std::io::Result<()> {
        let mut half = self.write_half.lock().await;
        half.shutdown().await
    }
}
