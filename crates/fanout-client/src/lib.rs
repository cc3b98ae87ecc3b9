//! Client library for the fan-out relay hub.
//!
//! [`ClientSession`] wraps one TCP connection and implements the three
//! request verbs. [`handle_incoming_messages`] is a standalone reader
//! routine for the unsolicited pushes a `relay` call from another client
//! produces on this connection.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod error;

pub use client::{ClientSession, handle_incoming_messages};
pub use error::ClientError;
