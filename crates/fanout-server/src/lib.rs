//! The fan-out relay hub server.
//!
//! A client connects, is handed an id, and can then ask `who_am_i`, ask
//! `who_is_here` for the ids of every other connected client, or `relay` a
//! message body to a list of receiver ids. The hub does not interpret
//! message bodies at all - it only moves bytes from sender to receivers.
//!
//! # Layout
//!
//! - [`id_allocator`]: pluggable client id allocation.
//! - [`connection`]: one live connection's write-side state.
//! - [`registry`]: the shared id → connection map.
//! - [`session`]: the per-connection read loop and verb dispatch.
//! - [`server`]: the listening socket and acceptor loop.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod connection;
pub mod error;
pub mod id_allocator;
pub mod registry;
pub mod server;
pub mod session;

pub use connection::ConnectionEntry;
pub use error::ServerError;
pub use id_allocator::{CountingIdAllocator, IdAllocator, RandomIdAllocator};
pub use registry::ConnectionRegistry;
pub use server::{Server, ServerConfig};
