//! Server error types.

use thiserror::Error;

/// Errors that can occur in the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration error (invalid bind address, etc.).
    ///
    /// Fatal: fix configuration and restart.
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport/network error (bind failure, accept failure, I/O error).
    ///
    /// May be transient (a single accept failing) or fatal (bind address
    /// already in use).
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Protocol error surfaced from `fanout-proto`.
    ///
    /// Indicates a peer sent malformed data. Fatal for that connection, but
    /// the server continues serving everyone else.
    #[error("protocol error: {0}")]
    Protocol(#[from] fanout_proto::ProtocolError),

    /// The id allocator produced an id already present in the registry.
    ///
    /// Should not happen given the allocator contract; treated as an
    /// internal invariant violation. The caller retries allocation once.
    #[error("allocator produced a colliding id: {0}")]
    RegistryCollision(u64),

    /// [`Server::stop`](crate::server::Server::stop) failed to close every
    /// connection cleanly.
    #[error(transparent)]
    Shutdown(#[from] MultiCloseError),
}

/// An aggregated failure from [`crate::server::Server::stop`]: the per-entry
/// close errors encountered while tearing down every registered connection.
#[derive(Debug, Error)]
#[error("failed to close {} of {total} connections", failures.len())]
pub struct MultiCloseError {
    /// Total number of connections the shutdown attempted to close.
    pub total: usize,
    /// `(client id, error)` pairs for every close that failed.
    pub failures: Vec<(u64, std::io::Error)>,
}
