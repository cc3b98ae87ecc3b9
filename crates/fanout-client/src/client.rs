//! The client session: one TCP connection to a fan-out hub.

use fanout_proto::{ClientId, InboundMessage, RelayRequest, Verb, codec, id_list, inbound};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::{
        TcpStream, ToSocketAddrs,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::mpsc,
};

use crate::error::ClientError;

/// Maximum relay body length this client will send or read off the wire by
/// default; matches the server's default `--max-message-bytes`.
pub use fanout_proto::request::DEFAULT_MAX_BODY_LEN;

/// One connection to a fan-out relay hub.
///
/// The consumer must not call the request methods (`who_am_i`,
/// `list_client_ids`, `send_msg`) concurrently with
/// [`ClientSession::handle_incoming_messages`] on the halves of the same
/// connection: the protocol multiplexes request/response traffic and
/// unsolicited pushes on one byte stream, and nothing downstream
/// distinguishes them except call order.
pub struct ClientSession<S = TcpStream> {
    stream: S,
}

impl ClientSession<TcpStream> {
    /// Open a TCP connection to `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Protocol`] if the connection cannot be
    /// established.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await.map_err(fanout_proto::ProtocolError::Io)?;
        Ok(Self { stream })
    }

    /// Split this session into independent read and write halves, so the
    /// write half can keep issuing requests while the read half is handed
    /// to [`ClientSession::handle_incoming_messages`] on its own task.
    #[must_use]
    pub fn into_split(self) -> (OwnedReadHalf, OwnedWriteHalf) {
        self.stream.into_split()
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> ClientSession<S> {
    /// Wrap an already-connected stream (used by tests against an in-memory
    /// duplex, and available to any caller with its own connection setup).
    pub fn from_stream(stream: S) -> Self {
        Self { stream }
    }

    /// Ask the hub for this connection's own id.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Protocol`] if the request or response fails.
    pub async fn who_am_i(&mut self) -> Result<ClientId, ClientError> {
        codec::write_verb(&mut self.stream, Verb::WhoAmI).await?;
        let id = codec::read_u64(&mut self.stream).await?;
        Ok(id)
    }

    /// Ask the hub for the id of every other currently registered client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Protocol`] if the request, response, or
    /// IdList decode fails.
    pub async fn list_client_ids(&mut self) -> Result<Vec<ClientId>, ClientError> {
        codec::write_verb(&mut self.stream, Verb::WhoIsHere).await?;
        let blob = codec::read_blob(&mut self.stream).await?;
        Ok(id_list::decode(&blob)?)
    }

    /// Ask the hub to relay `body` to every id in `receivers`.
    ///
    /// Returns once the request has been handed to the transport; this is
    /// not a delivery confirmation; delivery to any individual receiver is
    /// best-effort on the server's side.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Protocol`] if the receiver list or body
    /// cannot be encoded, or if the write fails.
    pub async fn send_msg(&mut self, receivers: &[ClientId], body: &[u8]) -> Result<(), ClientError> {
        codec::write_verb(&mut self.stream, Verb::Relay).await?;
        let request = RelayRequest { receivers: receivers.to_vec(), body: body.to_vec() };
        request.write(&mut self.stream).await?;
        Ok(())
    }
}

/// Read unsolicited inbound-message pushes from `read_half` in a loop,
/// forwarding each onto `queue`.
///
/// Terminates on the first read error (the connection closed or sent a
/// malformed frame) or once `queue` is closed (the consumer is no longer
/// interested). Either way, this is a clean termination, not a panic.
pub async fn handle_incoming_messages(
    mut read_half: OwnedReadHalf,
    queue: mpsc::Sender<InboundMessage>,
) {
    loop {
        let message = match inbound::read_default(&mut read_half).await {
            Ok(message) => message,
            Err(err) => {
                tracing::debug!(%err, "inbound reader stopping: read failed");
                return;
            },
        };

        if queue.send(message).await.is_err() {
            tracing::debug!("inbound reader stopping: queue closed");
            return;
        }
    }
}
