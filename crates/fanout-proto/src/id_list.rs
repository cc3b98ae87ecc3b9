//! IdList blob encoding.
//!
//! The reference protocol frames an ordered sequence of `u64` client ids as
//! a single-byte-length-prefixed blob (the outer prefix lives in
//! [`crate::codec`]). This module owns the blob's *internal* layout: a
//! little-endian `u16` element count followed by that many little-endian
//! `u64` values. See the crate-level design notes for why this replaces the
//! reference implementation's language-specific self-describing encoder.

use bytes::{Buf, BufMut};

use crate::error::ProtocolError;

/// Maximum bytes an IdList blob may occupy, imposed by the outer u8 length
/// prefix that always frames it.
pub const MAX_BLOB_LEN: usize = u8::MAX as usize;

/// Maximum number of ids a single blob can carry given [`MAX_BLOB_LEN`].
pub const MAX_ELEMENTS: usize = (MAX_BLOB_LEN - 2) / 8;

/// Serialize an ordered sequence of ids into the blob's internal layout.
///
/// # Errors
///
/// Returns [`ProtocolError::LengthTooLarge`] if `ids` has more elements than
/// fit in a blob bounded by the outer u8 length prefix (see
/// [`MAX_ELEMENTS`]).
pub fn encode(ids: &[u64]) -> Result<Vec<u8>, ProtocolError> {
    if ids.len() > MAX_ELEMENTS {
        return Err(ProtocolError::LengthTooLarge { size: ids.len(), max: MAX_ELEMENTS });
    }

    #[allow(clippy::cast_possible_truncation)]
    let count = ids.len() as u16;

    let mut out = Vec::with_capacity(2 + ids.len() * 8);
    out.put_u16_le(count);
    for id in ids {
        out.put_u64_le(*id);
    }

    debug_assert!(out.len() <= MAX_BLOB_LEN);
    Ok(out)
}

/// Parse a blob (without its outer length prefix) into its ids.
///
/// # Errors
///
/// Returns [`ProtocolError::IdListTruncated`] if the declared element count
/// does not fit the bytes actually present.
pub fn decode(mut blob: &[u8]) -> Result<Vec<u64>, ProtocolError> {
    if blob.len() < 2 {
        return Err(ProtocolError::IdListTruncated { expected: 1, actual: blob.len() });
    }

    let count = blob.get_u16_le() as usize;
    let needed = count * 8;

    if blob.len() < needed {
        return Err(ProtocolError::IdListTruncated { expected: count, actual: blob.len() / 8 });
    }

    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        ids.push(blob.get_u64_le());
    }

    Ok(ids)
}
