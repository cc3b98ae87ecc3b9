//! Wire primitives: length-prefixed blobs and fixed-width little-endian
//! integers, read and written against any `AsyncRead`/`AsyncWrite`.
//!
//! Every function here maps directly to one line of §4.1 of the protocol
//! design: a single byte length prefix, or a fixed 4- or 8-byte integer.
//! Higher-level framing (verbs, IdList blobs, relay bodies) is built out of
//! these primitives in [`crate::verb`], [`crate::id_list`], and
//! [`crate::request`].

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{error::ProtocolError, verb::Verb};

/// Read a u8-length-prefixed blob: one byte N, then N bytes.
///
/// # Errors
///
/// Returns [`ProtocolError::Io`] if the socket closes or errors before the
/// prefix or the blob arrive in full.
pub async fn read_blob<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let len = reader.read_u8().await?;
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}

/// Write a u8-length-prefixed blob.
///
/// # Errors
///
/// Returns [`ProtocolError::LengthTooLarge`] if `blob` is longer than 255
/// bytes (the prefix cannot represent it), or [`ProtocolError::Io`] on a
/// write failure.
pub async fn write_blob<W: AsyncWrite + Unpin>(
    writer: &mut W,
    blob: &[u8],
) -> Result<(), ProtocolError> {
    if blob.len() > usize::from(u8::MAX) {
        return Err(ProtocolError::LengthTooLarge { size: blob.len(), max: usize::from(u8::MAX) });
    }

    #[allow(clippy::cast_possible_truncation)]
    writer.write_u8(blob.len() as u8).await?;
    writer.write_all(blob).await?;
    Ok(())
}

/// Read a verb: a u8-length-prefixed ASCII string, parsed into a [`Verb`].
///
/// # Errors
///
/// Returns [`ProtocolError::VerbLengthOutOfRange`] if the wire sent a
/// zero-length verb (the prelude's length byte is specified as `1..=255`, see
/// §6), [`ProtocolError::UnknownVerb`] if the string isn't a recognized verb,
/// or [`ProtocolError::Io`] if the socket fails mid-read.
pub async fn read_verb<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Verb, ProtocolError> {
    let bytes = read_blob(reader).await?;
    if bytes.is_empty() {
        return Err(ProtocolError::VerbLengthOutOfRange(bytes.len()));
    }

    let s = String::from_utf8_lossy(&bytes);
    Verb::parse(&s)
}

/// Write a verb as its u8-length-prefixed ASCII wire string.
///
/// # Errors
///
/// Returns [`ProtocolError::Io`] on a write failure.
pub async fn write_verb<W: AsyncWrite + Unpin>(
    writer: &mut W,
    verb: Verb,
) -> Result<(), ProtocolError> {
    write_blob(writer, verb.as_str().as_bytes()).await
}

/// Read a little-endian `u32`.
///
/// # Errors
///
/// Returns [`ProtocolError::Io`] if the socket fails mid-read.
pub async fn read_u32<R: AsyncRead + Unpin>(reader: &mut R) -> Result<u32, ProtocolError> {
    Ok(reader.read_u32_le().await?)
}

/// Write a little-endian `u32`.
///
/// # Errors
///
/// Returns [`ProtocolError::Io`] on a write failure.
pub async fn write_u32<W: AsyncWrite + Unpin>(
    writer: &mut W,
    value: u32,
) -> Result<(), ProtocolError> {
    writer.write_u32_le(value).await?;
    Ok(())
}

/// Read a little-endian `u64`.
///
/// # Errors
///
/// Returns [`ProtocolError::Io`] if the socket fails mid-read.
pub async fn read_u64<R: AsyncRead + Unpin>(reader: &mut R) -> Result<u64, ProtocolError> {
    Ok(reader.read_u64_le().await?)
}

/// Write a little-endian `u64`.
///
/// # Errors
///
/// Returns [`ProtocolError::Io`] on a write failure.
pub async fn write_u64<W: AsyncWrite + Unpin>(
    writer: &mut W,
    value: u64,
) -> Result<(), ProtocolError> {
    writer.write_u64_le(value).await?;
    Ok(())
}

/// Write a raw byte slice with no length prefix (the caller has already
/// written whatever length field precedes it).
///
/// # Errors
///
/// Returns [`ProtocolError::Io`] on a write failure.
pub async fn write_all_bytes<W: AsyncWrite + Unpin>(
    writer: &mut W,
    bytes: &[u8],
) -> Result<(), ProtocolError> {
    writer.write_all(bytes).await?;
    Ok(())
}

/// Read exactly `len` bytes, rejecting the read up front if `len` exceeds
/// `max`.
///
/// Used for the relay message body, whose length comes from an untrusted
/// peer and must not be allowed to drive an unbounded allocation (see the
/// `max-message-bytes` configuration knob).
///
/// # Errors
///
/// Returns [`ProtocolError::LengthTooLarge`] if `len > max`, or
/// [`ProtocolError::Io`] if the socket fails mid-read.
pub async fn read_bounded<R: AsyncRead + Unpin>(
    reader: &mut R,
    len: u32,
    max: u32,
) -> Result<Vec<u8>, ProtocolError> {
    if len > max {
        return Err(ProtocolError::LengthTooLarge {
            size: len as usize,
            max: max as usize,
        });
    }

    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}
