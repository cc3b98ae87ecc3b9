//! Wire protocol for the fan-out relay hub.
//!
//! This crate owns everything bit-exact about the protocol: the request
//! prelude (a u8-length-prefixed verb string), the three verb bodies
//! (`who_am_i`, `who_is_here`, `relay`), the IdList blob encoding, and the
//! unsolicited inbound-message push. It has no opinion about sockets,
//! connection registries, or concurrency — those live in `fanout-server`
//! and `fanout-client`, which both depend on this crate for framing.
//!
//! # Layout
//!
//! - [`codec`]: generic length-prefixed-blob and fixed-width integer I/O.
//! - [`id_list`]: the IdList blob's internal `u16 count + u64*` layout.
//! - [`verb`]: the closed set of request verbs.
//! - [`request`]: the `relay` verb's request body.
//! - [`inbound`]: the unsolicited push frame.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod error;
pub mod id_list;
pub mod inbound;
pub mod request;
pub mod verb;

pub use error::{ProtocolError, Result};
pub use inbound::InboundMessage;
pub use request::RelayRequest;
pub use verb::Verb;

/// Type used for client identifiers throughout this codebase.
///
/// A plain `u64` rather than a newtype: the wire representation is already a
/// raw little-endian `u64`, and every layer that touches it (registry keys,
/// frame fields, CLI output) wants the primitive directly.
pub type ClientId = u64;
