//! The `relay` verb's request body.
//!
//! `who_am_i` and `who_is_here` have no request body worth a dedicated type
//! (they're handled directly with [`crate::codec`] and [`crate::id_list`]
//! at the call site); `relay` carries enough structure — a receiver list and
//! an opaque body — to be worth its own read/write pair.

use tokio::io::{AsyncRead, AsyncWrite};

use crate::{codec, error::ProtocolError, id_list};

/// Default ceiling on a relay body's declared length, matching the
/// `--max-message-bytes` default (16 MiB). Call sites that parse a
/// server-configured maximum should pass that value to [`RelayRequest::read`]
/// instead of this constant.
pub const DEFAULT_MAX_BODY_LEN: u32 = 16 * 1024 * 1024;

/// A decoded `relay` request body: an ordered receiver list plus an
/// application-opaque message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayRequest {
    /// Receiver ids, in the order the sender listed them. Duplicates and
    /// unregistered ids are both legal; the relay handler decides what to do
    /// with them.
    pub receivers: Vec<u64>,
    /// The opaque message body to fan out verbatim.
    pub body: Vec<u8>,
}

impl RelayRequest {
    /// Read a `relay` request body (the verb prefix has already been
    /// consumed by the caller).
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::LengthTooLarge`] if the declared body length
    /// exceeds `max_body_len`, [`ProtocolError::IdListTruncated`] if the
    /// receiver blob is malformed, or [`ProtocolError::Io`] on a read
    /// failure.
    pub async fn read<R: AsyncRead + Unpin>(
        reader: &mut R,
        max_body_len: u32,
    ) -> Result<Self, ProtocolError> {
        let blob = codec::read_blob(reader).await?;
        let receivers = id_list::decode(&blob)?;

        let body_len = codec::read_u32(reader).await?;
        let body = codec::read_bounded(reader, body_len, max_body_len).await?;

        Ok(Self { receivers, body })
    }

    /// Write a `relay` request body (the caller writes the verb prefix
    /// first).
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::LengthTooLarge`] if `receivers` has more
    /// elements than fit in a u8-length-prefixed blob, or
    /// [`ProtocolError::Io`] on a write failure.
    pub async fn write<W: AsyncWrite + Unpin>(&self, writer: &mut W) -> Result<(), ProtocolError> {
        let blob = id_list::encode(&self.receivers)?;
        codec::write_blob(writer, &blob).await?;

        #[allow(clippy::cast_possible_truncation)]
        let body_len = self.body.len() as u32;
        codec::write_u32(writer, body_len).await?;
        codec::write_all_bytes(writer, &self.body).await
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[tokio::test]
    async fn relay_request_round_trips() {
        let request = RelayRequest { receivers: vec![1, 2, 3], body: b"Hello world!".to_vec() };

        let mut wire = Vec::new();
        request.write(&mut wire).await.unwrap();

        let mut cursor = Cursor::new(wire);
        let decoded = RelayRequest::read(&mut cursor, DEFAULT_MAX_BODY_LEN).await.unwrap();
        assert_eq!(decoded, request);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let request = RelayRequest { receivers: vec![], body: vec![0u8; 100] };
        let mut wire = Vec::new();
        request.write(&mut wire).await.unwrap();

        let mut cursor = Cursor::new(wire);
        let err = RelayRequest::read(&mut cursor, 10).await.unwrap_err();
        assert!(matches!(err, ProtocolError::LengthTooLarge { .. }));
    }
}
