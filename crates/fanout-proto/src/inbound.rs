//! The unsolicited inbound-message push.
//!
//! Unlike every other frame in this protocol, an `InboundMessage` is never
//! preceded by a verb — it can arrive on a receiver's socket at any point
//! between that receiver's own request/response pairs, as a side effect of
//! some other client's `relay` call.

use tokio::io::{AsyncRead, AsyncWrite};

use crate::{codec, error::ProtocolError, request::DEFAULT_MAX_BODY_LEN};

/// A relayed message as seen by the receiver: who sent it, and the opaque
/// body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// The id of the client whose `relay` call produced this push.
    pub sender: u64,
    /// The opaque message body, copied verbatim from the sender's request.
    pub body: Vec<u8>,
}

impl InboundMessage {
    /// Read one inbound push: 8-byte sender id, 4-byte length, body.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::LengthTooLarge`] if the declared length
    /// exceeds `max_body_len`, or [`ProtocolError::Io`] if the socket fails
    /// mid-read (including a clean close, which callers should treat as
    /// "reader done", not a protocol violation).
    pub async fn read<R: AsyncRead + Unpin>(
        reader: &mut R,
        max_body_len: u32,
    ) -> Result<Self, ProtocolError> {
        let sender = codec::read_u64(reader).await?;
        let len = codec::read_u32(reader).await?;
        let body = codec::read_bounded(reader, len, max_body_len).await?;
        Ok(Self { sender, body })
    }

    /// Write one inbound push.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Io`] on a write failure.
    pub async fn write<W: AsyncWrite + Unpin>(&self, writer: &mut W) -> Result<(), ProtocolError> {
        codec::write_u64(writer, self.sender).await?;

        #[allow(clippy::cast_possible_truncation)]
        let body_len = self.body.len() as u32;
        codec::write_u32(writer, body_len).await?;
        codec::write_all_bytes(writer, &self.body).await
    }
}

/// Read an inbound push using the default body-length ceiling.
///
/// Convenience wrapper for callers (notably the client reader) that have no
/// server-configured maximum to respect.
///
/// # Errors
///
/// Same as [`InboundMessage::read`].
pub async fn read_default<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<InboundMessage, ProtocolError> {
    InboundMessage::read(reader, DEFAULT_MAX_BODY_LEN).await
}
