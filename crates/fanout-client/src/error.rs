//! Client error types.

use thiserror::Error;

/// Errors a [`crate::client::ClientSession`] can produce.
///
/// A thin wrapper over [`fanout_proto::ProtocolError`]: an oversized
/// receiver list or body surfaces as
/// [`ProtocolError::LengthTooLarge`](fanout_proto::ProtocolError::LengthTooLarge)
/// through the same variant as any other framing failure.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The underlying protocol framing failed (I/O error, bad length, etc.).
    #[error("protocol error: {0}")]
    Protocol(#[from] fanout_proto::ProtocolError),
}
