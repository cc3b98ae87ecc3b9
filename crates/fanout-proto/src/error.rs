//! Protocol-level error types.
//!
//! These describe failures in parsing or encoding the wire format itself,
//! independent of any particular transport or server/client runtime.

use thiserror::Error;

/// Errors produced while decoding or encoding frames on the wire.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The socket was closed or errored before the expected number of bytes
    /// arrived. The connection is unrecoverable for this direction.
    #[error("io error while framing: {0}")]
    Io(#[from] std::io::Error),

    /// A verb string was not one of the recognized verbs.
    #[error("unrecognized verb: {0:?}")]
    UnknownVerb(String),

    /// A verb string exceeded the 255-byte u8 length-prefix limit, or was
    /// empty.
    #[error("verb length {0} out of range 1..=255")]
    VerbLengthOutOfRange(usize),

    /// An id-list blob's declared element count does not fit in the bytes
    /// actually carried by the outer length prefix.
    #[error("id list blob truncated: expected {expected} elements, got {actual} bytes of room")]
    IdListTruncated {
        /// Elements the blob header claims.
        expected: usize,
        /// Bytes actually available for element data.
        actual: usize,
    },

    /// A relay body (or any other declared-length blob) claimed a size
    /// larger than the configured maximum.
    #[error("declared length {size} exceeds maximum {max}")]
    LengthTooLarge {
        /// The length the peer claimed.
        size: usize,
        /// The configured maximum.
        max: usize,
    },
}

/// Convenience alias for results over [`ProtocolError`].
pub type Result<T> = std::result::Result<T, ProtocolError>;
