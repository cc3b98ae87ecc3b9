//! The acceptor loop and top-level server handle.

use std::sync::Arc;

use fanout_proto::ClientId;
use tokio::{net::TcpListener, sync::Notify};

use crate::{
    error::{MultiCloseError, ServerError},
    id_allocator::IdAllocator,
    registry::ConnectionRegistry,
    session,
    ConnectionEntry,
};

/// Configuration a [`Server`] is built from.
pub struct ServerConfig {
    /// Address to bind the listening socket to.
    pub bind: String,
    /// Soft cap on simultaneously registered connections. An accept past
    /// this limit is refused and the socket is immediately dropped.
    pub max_connections: usize,
    /// Maximum relay body length, in bytes, this server will read off the
    /// wire before rejecting the frame.
    pub max_message_bytes: u32,
}

/// A running fan-out relay hub.
///
/// `Server` owns the listening socket and the shared [`ConnectionRegistry`].
/// Call [`Server::run`] to accept connections until the listener hits an
/// unrecoverable error or [`Server::stop`] signals shutdown: it closes every
/// live connection and tells the accept loop to stop driving the listener, so
/// a subsequent `run` iteration never calls `accept` again.
pub struct Server {
    listener: TcpListener,
    registry: Arc<ConnectionRegistry>,
    allocator: Arc<dyn IdAllocator>,
    max_connections: usize,
    max_message_bytes: u32,
    shutdown: Notify,
}

impl Server {
    /// Bind a listening socket at `config.bind` and prepare a server around
    /// it, drawing client ids from `allocator`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] if `config.max_connections` is zero, or
    /// [`ServerError::Transport`] if the bind fails.
    pub async fn bind(
        config: ServerConfig,
        allocator: Arc<dyn IdAllocator>,
    ) -> Result<Self, ServerError> {
        if config.max_connections == 0 {
            return Err(ServerError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }

        let listener = TcpListener::bind(&config.bind).await?;
        tracing::info!(bind = %config.bind, "listening");

        Ok(Self {
            listener,
            registry: Arc::new(ConnectionRegistry::new()),
            allocator,
            max_connections: config.max_connections,
            max_message_bytes: config.max_message_bytes,
            shutdown: Notify::new(),
        })
    }

    /// The address this server actually bound to (useful when `bind` asked
    /// for an ephemeral port).
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] if the OS cannot report the local
    /// address of the listening socket.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections, spawning one session task per socket, until
    /// [`Server::stop`] signals shutdown or the listener hits an
    /// unrecoverable error.
    ///
    /// A per-accept error whose kind indicates a transient, already-gone-away
    /// peer (connection reset/aborted/refused between the kernel accepting
    /// the SYN and us calling `accept`) is logged and the loop continues; any
    /// other accept error is treated as the listener itself being broken and
    /// terminates the loop.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] if `accept` fails in a way the
    /// listener cannot recover from.
    pub async fn run(&self) -> Result<(), ServerError> {
        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.notified() => {
                    tracing::info!("accept loop stopping: shutdown requested");
                    return Ok(());
                }

                accepted = self.listener.accept() => {
                    let (socket, peer_addr) = match accepted {
                        Ok(pair) => pair,
                        Err(err) if is_transient_accept_error(&err) => {
                            tracing::warn!(%err, "accept failed, continuing");
                            continue;
                        },
                        Err(err) => {
                            tracing::error!(%err, "accept loop terminating: unrecoverable listener error");
                            return Err(ServerError::Transport(err));
                        },
                    };

                    self.handle_accepted(socket, peer_addr).await;
                }
            }
        }
    }

    /// Register a freshly accepted socket and spawn its session task.
    async fn handle_accepted(&self, socket: tokio::net::TcpStream, peer_addr: std::net::SocketAddr) {
        if self.registry.len().await >= self.max_connections {
            tracing::warn!(%peer_addr, "rejecting connection: at max-connections");
            drop(socket);
            return;
        }

        let id = self.allocate_unique_id().await;
        let (read_half, write_half) = socket.into_split();
        let entry = Arc::new(ConnectionEntry::new(id, write_half));

        if !self.registry.insert(id, entry).await {
            let err = ServerError::RegistryCollision(id);
            tracing::error!(%err, "dropping connection after allocator retry still collided");
            return;
        }

        tracing::info!(client_id = id, %peer_addr, "accepted connection");

        let registry = Arc::clone(&self.registry);
        let max_message_bytes = self.max_message_bytes;
        tokio::spawn(async move {
            session::run(id, read_half, Arc::clone(&registry), max_message_bytes).await;
            registry.remove(id).await;
            tracing::info!(client_id = id, "connection closed");
        });
    }

    /// Draw an id from the allocator, retrying once on an (extremely
    /// unlikely) registry collision.
    async fn allocate_unique_id(&self) -> ClientId {
        let id = self.allocator.allocate();
        if self.registry.lookup(id).await.is_none() {
            return id;
        }
        tracing::warn!(client_id = id, "allocator collision, drawing again");
        self.allocator.allocate()
    }

    /// Signal the accept loop to stop, then close every currently registered
    /// connection.
    ///
    /// Signalling shutdown first narrows the window in which a connection
    /// could be accepted and registered while this method is busy closing
    /// the connections it already knew about. Once this returns, any
    /// in-progress or future call to [`Server::run`] on this server will not
    /// call `accept` again.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] wrapping a [`MultiCloseError`] if any
    /// connection failed to shut down cleanly; every connection is still
    /// attempted even if an earlier one fails.
    pub async fn stop(&self) -> Result<(), ServerError> {
        self.shutdown.notify_one();

        let snapshot = self.registry.snapshot().await;
        let total = snapshot.len();
        let mut failures = Vec::new();

        for (id, entry) in snapshot {
            if let Err(err) = entry.shutdown().await {
                failures.push((id, err));
            }
            self.registry.remove(id).await;
        }

        if failures.is_empty() {
            tracing::info!(total, "stopped: all connections closed");
            Ok(())
        } else {
            tracing::warn!(total, failed = failures.len(), "stopped with errors");
            Err(MultiCloseError { total, failures }.into())
        }
    }

    /// Current number of registered connections.
    pub async fn connection_count(&self) -> usize {
        self.registry.len().await
    }
}

/// Whether an `accept` error is a transient, per-connection hiccup (the peer
/// went away between the kernel's SYN handling and our `accept` call) rather
/// than the listening socket itself being broken.
fn is_transient_accept_error(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::ConnectionReset
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id_allocator::CountingIdAllocator;

    #[tokio::test]
    async fn bind_rejects_zero_max_connections() {
        let config = ServerConfig {
            bind: "127.0.0.1:0".to_string(),
            max_connections: 0,
            max_message_bytes: 1024,
        };

        let err = Server::bind(config, Arc::new(CountingIdAllocator::new())).await.unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[tokio::test]
    async fn stop_ends_a_concurrently_running_accept_loop() {
        let config = ServerConfig {
            bind: "127.0.0.1:0".to_string(),
            max_connections: 10,
            max_message_bytes: 1024,
        };
        let server =
            Arc::new(Server::bind(config, Arc::new(CountingIdAllocator::new())).await.unwrap());

        let runner = Arc::clone(&server);
        let run_handle = tokio::spawn(async move { runner.run().await });

        server.stop().await.unwrap();

        let result = tokio::time::timeout(std::time::Duration::from_secs(2), run_handle)
            .await
            .expect("run() should return promptly after stop()")
            .unwrap();
        assert!(result.is_ok());
    }
}
