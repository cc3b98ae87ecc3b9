//! Id allocation strategies.
//!
//! `allocate` must never return a value it has already returned, for the
//! lifetime of one allocator instance, and must be safe to call from many
//! connection-handling tasks concurrently without external locking.

use std::sync::atomic::{AtomicU64, Ordering};

use fanout_proto::ClientId;

/// Produces unique client ids for newly-accepted connections.
pub trait IdAllocator: Send + Sync {
    /// Allocate a fresh id, never before returned by this allocator.
    fn allocate(&self) -> ClientId;
}

/// Draws each id from the OS cryptographic RNG.
///
/// Collisions are not checked: at 64 bits of entropy per draw, the birthday
/// bound on a collision is far beyond any realistic number of connections
/// this server will see in one lifetime. This is the production default.
///
/// # Panics
///
/// Panics if the OS RNG fails. A server that cannot draw randomness cannot
/// hand out ids at all; continuing would silently hand out a zeroed or
/// otherwise degraded id instead of failing loudly.
#[derive(Debug, Default)]
pub struct RandomIdAllocator;

impl RandomIdAllocator {
    /// Create a new random allocator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl IdAllocator for RandomIdAllocator {
    #[allow(clippy::expect_used)]
    fn allocate(&self) -> ClientId {
        let mut buf = [0u8; 8];
        getrandom::fill(&mut buf)
            .expect("invariant: OS RNG failure is unrecoverable - server cannot allocate ids");
        u64::from_le_bytes(buf)
    }
}

/// Hands out ids from a monotonically increasing counter, starting at 1.
///
/// Deterministic and easy to assert on, which is why tests reach for this
/// instead of [`RandomIdAllocator`].
#[derive(Debug, Default)]
pub struct CountingIdAllocator {
    next: AtomicU64,
}

impl CountingIdAllocator {
    /// Create a new counting allocator whose first id will be 1.
    #[must_use]
    pub fn new() -> Self {
        Self { next: AtomicU64::new(1) }
    }
}

impl IdAllocator for CountingIdAllocator {
    fn allocate(&self) -> ClientId {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}
