//! Per-connection session handler.
//!
//! One instance of [`run`] is spawned per accepted socket. It owns the read
//! half and loops reading request frames, dispatching each to the matching
//! handler. The write half lives in the [`ConnectionEntry`] the registry
//! holds, since relay fan-out from *other* sessions needs to write to this
//! connection too.

use std::sync::Arc;

use fanout_proto::{ClientId, InboundMessage, ProtocolError, RelayRequest, Verb, codec};
use tokio::net::tcp::OwnedReadHalf;

use crate::{connection::ConnectionEntry, registry::ConnectionRegistry};

/// Run one client's session: read requests until the socket closes or a
/// framing error makes the stream unrecoverable.
///
/// On return, the caller (the acceptor) removes `id` from the registry -
/// this function does not remove itself, so that the acceptor can log
/// connection counts in one place.
pub async fn run(
    id: ClientId,
    mut read_half: OwnedReadHalf,
    registry: Arc<ConnectionRegistry>,
    max_message_bytes: u32,
) {
    loop {
        let verb = match codec::read_verb(&mut read_half).await {
            Ok(verb) => verb,
            Err(ProtocolError::UnknownVerb(verb)) => {
                // §4.4: a known weakness - we cannot know how many body
                // bytes an unrecognized verb would have carried, so the
                // stream may now be desynchronized. We keep the literal
                // specified behavior (log and continue) rather than
                // closing, since closing is a protocol-visible change no
                // tested scenario requires.
                tracing::warn!(client_id = id, %verb, "unknown verb");
                continue;
            },
            Err(_) => {
                tracing::debug!(client_id = id, "read error, closing session");
                break;
            },
        };

        let Some(entry) = registry.lookup(id).await else {
            // We were removed from the registry concurrently (shouldn't
            // happen while this very task is the only remover, but would
            // indicate the connection is being torn down elsewhere).
            break;
        };

        let outcome = dispatch(verb, id, &entry, &mut read_half, &registry, max_message_bytes).await;
        if outcome.is_err() {
            tracing::debug!(client_id = id, "session ended while handling {}", verb.as_str());
            break;
        }
    }
}

/// Dispatch one already-read verb to its handler.
async fn dispatch(
    verb: Verb,
    id: ClientId,
    entry: &ConnectionEntry,
    read_half: &mut OwnedReadHalf,
    registry: &ConnectionRegistry,
    max_message_bytes: u32,
) -> Result<(), ProtocolError> {
    match verb {
        Verb::WhoAmI => entry.respond_who_am_i().await,
        Verb::WhoIsHere => {
            let peers = registry.ids_excluding(id).await;
            entry.respond_who_is_here(&peers).await
        },
        Verb::Relay => handle_relay(id, read_half, registry, max_message_bytes).await,
    }
}

/// Handle a `relay` request: decode the receiver list and body, then
/// best-effort fan the message out to every receiver still registered.
async fn handle_relay(
    sender: ClientId,
    read_half: &mut OwnedReadHalf,
    registry: &ConnectionRegistry,
    max_message_bytes: u32,
) -> Result<(), ProtocolError> {
    let request = RelayRequest::read(read_half, max_message_bytes).await?;

    for receiver in request.receivers {
        let Some(target) = registry.lookup(receiver).await else {
            tracing::debug!(sender, receiver, "relay target not registered, dropping");
            continue;
        };

        let message = InboundMessage { sender, body: request.body.clone() };
        if let Err(err) = target.push_inbound(&message).await {
            tracing::warn!(sender, receiver, %err, "relay write failed, continuing with remaining receivers");
        }
    }

    Ok(())
}
