//! Connection registry.
//!
//! The registry maps every currently-connected client's id to the
//! [`ConnectionEntry`] owning its socket. It is the only structure shared by
//! every connection-handling task, so its critical sections stay O(1) for
//! insert/lookup/remove; `snapshot` is the one O(n) operation, used for
//! `who_is_here` and for closing every connection on shutdown.
//!
//! A single `RwLock` around a `HashMap` is the coarse mutex this system's
//! request rate can comfortably afford - there is no need for sharding or a
//! lock-free map here.

use std::{collections::HashMap, sync::Arc};

use fanout_proto::ClientId;
use tokio::sync::RwLock;

use crate::connection::ConnectionEntry;

/// Concurrent id → connection mapping.
#[derive(Default)]
pub struct ConnectionRegistry {
    entries: RwLock<HashMap<ClientId, Arc<ConnectionEntry>>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a newly-accepted connection.
    ///
    /// Returns `false` if `id` is already present, which should not happen
    /// given the allocator's uniqueness contract; callers treat this as a
    /// [`crate::error::ServerError::RegistryCollision`].
    pub async fn insert(&self, id: ClientId, entry: Arc<ConnectionEntry>) -> bool {
        let mut entries = self.entries.write().await;
        if entries.contains_key(&id) {
            return false;
        }
        entries.insert(id, entry);
        true
    }

    /// Look up a connection by id.
    ///
    /// Callers that are about to write to the returned entry (relay
    /// handlers) must treat presence as a point-in-time fact: the entry may
    /// be removed immediately after this call returns.
    pub async fn lookup(&self, id: ClientId) -> Option<Arc<ConnectionEntry>> {
        self.entries.read().await.get(&id).cloned()
    }

    /// Remove a connection. Idempotent - removing an absent id is a no-op.
    pub async fn remove(&self, id: ClientId) -> Option<Arc<ConnectionEntry>> {
        self.entries.write().await.remove(&id)
    }

    /// A point-in-time snapshot of every registered `(id, entry)` pair.
    ///
    /// Concurrent inserts and removes may race this call: the snapshot may
    /// miss a connection accepted during iteration, and may or may not
    /// include one removed during iteration. This is intentional (see the
    /// relay handler's re-`lookup` discipline) rather than a bug to fix.
    pub async fn snapshot(&self) -> Vec<(ClientId, Arc<ConnectionEntry>)> {
        self.entries.read().await.iter().map(|(id, entry)| (*id, Arc::clone(entry))).collect()
    }

    /// Every registered id except `excluding`.
    ///
    /// This is exactly the shape `who_is_here` needs, factored out since
    /// it's the one place this registry computes a filtered view rather
    /// than a raw snapshot.
    pub async fn ids_excluding(&self, excluding: ClientId) -> Vec<ClientId> {
        self.entries.read().await.keys().copied().filter(|id| *id != excluding).collect()
    }

    /// Number of currently registered connections.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the registry currently holds no connections.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use tokio::net::{TcpListener, TcpStream};

    use super::*;

    async fn dummy_entry(id: ClientId) -> Arc<ConnectionEntry> {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (accepted, connected) = tokio::join!(listener.accept(), TcpStream::connect(addr));
        let (socket, _) = accepted.unwrap();
        drop(connected.unwrap());
        let (_read, write) = socket.into_split();
        Arc::new(ConnectionEntry::new(id, write))
    }

    #[tokio::test]
    async fn insert_then_lookup() {
        let registry = ConnectionRegistry::new();
        let entry = dummy_entry(1).await;

        assert!(registry.insert(1, entry).await);
        assert!(registry.lookup(1).await.is_some());
        assert!(registry.lookup(2).await.is_none());
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_id() {
        let registry = ConnectionRegistry::new();
        assert!(registry.insert(1, dummy_entry(1).await).await);
        assert!(!registry.insert(1, dummy_entry(1).await).await);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let registry = ConnectionRegistry::new();
        registry.insert(1, dummy_entry(1).await).await;

        assert!(registry.remove(1).await.is_some());
        assert!(registry.remove(1).await.is_none());
        assert!(registry.lookup(1).await.is_none());
    }

    #[tokio::test]
    async fn ids_excluding_omits_only_the_caller() {
        let registry = ConnectionRegistry::new();
        registry.insert(1, dummy_entry(1).await).await;
        registry.insert(2, dummy_entry(2).await).await;
        registry.insert(3, dummy_entry(3).await).await;

        let mut others = registry.ids_excluding(2).await;
        others.sort_unstable();
        assert_eq!(others, vec![1, 3]);
    }

    #[tokio::test]
    async fn snapshot_reflects_current_membership() {
        let registry = ConnectionRegistry::new();
        registry.insert(1, dummy_entry(1).await).await;
        registry.insert(2, dummy_entry(2).await).await;

        let mut ids: Vec<_> = registry.snapshot().await.into_iter().map(|(id, _)| id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);

        registry.remove(1).await;
        let ids: Vec<_> = registry.snapshot().await.into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![2]);
    }
}
