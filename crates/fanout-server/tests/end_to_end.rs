//! End-to-end scenarios driven against a real `TcpListener`-backed server
//! through the `fanout-client` session API.

use std::{sync::Arc, time::Duration};

use fanout_client::ClientSession;
use fanout_server::{CountingIdAllocator, Server, ServerConfig};
use tokio::{sync::mpsc, time::timeout};

async fn spawn_server() -> (Arc<Server>, std::net::SocketAddr) {
    let config = ServerConfig {
        bind: "127.0.0.1:0".to_string(),
        max_connections: 100,
        max_message_bytes: 1024,
    };
    let server =
        Arc::new(Server::bind(config, Arc::new(CountingIdAllocator::new())).await.unwrap());
    let addr = server.local_addr().unwrap();

    let runner = Arc::clone(&server);
    tokio::spawn(async move {
        let _ = runner.run().await;
    });

    (server, addr)
}

#[tokio::test]
async fn single_client_self_id_and_empty_peer_list() {
    let (_server, addr) = spawn_server().await;
    let mut client = ClientSession::connect(addr).await.unwrap();

    let id = client.who_am_i().await.unwrap();
    assert!(id > 0);

    let peers = client.list_client_ids().await.unwrap();
    assert!(peers.is_empty());
}

#[tokio::test]
async fn two_clients_see_each_other_and_not_themselves() {
    let (_server, addr) = spawn_server().await;
    let mut a = ClientSession::connect(addr).await.unwrap();
    let mut b = ClientSession::connect(addr).await.unwrap();

    let id_a = a.who_am_i().await.unwrap();
    let id_b = b.who_am_i().await.unwrap();
    assert_ne!(id_a, id_b);

    assert_eq!(a.list_client_ids().await.unwrap(), vec![id_b]);
    assert_eq!(b.list_client_ids().await.unwrap(), vec![id_a]);
}

#[tokio::test]
async fn relay_fans_out_to_every_receiver() {
    let (_server, addr) = spawn_server().await;
    let mut a = ClientSession::connect(addr).await.unwrap();
    let mut b = ClientSession::connect(addr).await.unwrap();
    let mut c = ClientSession::connect(addr).await.unwrap();

    let id_a = a.who_am_i().await.unwrap();
    let id_b = b.who_am_i().await.unwrap();
    let id_c = c.who_am_i().await.unwrap();

    // "Hello world!" as literal bytes: 48 65 6c 6c 6f 20 77 6f 72 6c 64 21.
    let body = b"Hello world!";
    a.send_msg(&[id_b, id_c], body).await.unwrap();

    let (b_read, _b_write) = b.into_split();
    let (c_read, _c_write) = c.into_split();
    let (b_tx, mut b_rx) = mpsc::channel(4);
    let (c_tx, mut c_rx) = mpsc::channel(4);
    tokio::spawn(fanout_client::handle_incoming_messages(b_read, b_tx));
    tokio::spawn(fanout_client::handle_incoming_messages(c_read, c_tx));

    let received_b = timeout(Duration::from_secs(2), b_rx.recv()).await.unwrap().unwrap();
    let received_c = timeout(Duration::from_secs(2), c_rx.recv()).await.unwrap().unwrap();

    assert_eq!(received_b.sender, id_a);
    assert_eq!(received_b.body, body);
    assert_eq!(received_c.sender, id_a);
    assert_eq!(received_c.body, body);
}

#[tokio::test]
async fn relay_to_absent_receiver_does_not_disturb_other_deliveries() {
    let (_server, addr) = spawn_server().await;
    let mut a = ClientSession::connect(addr).await.unwrap();
    let mut b = ClientSession::connect(addr).await.unwrap();

    let id_b = b.who_am_i().await.unwrap();
    a.who_am_i().await.unwrap();

    a.send_msg(&[id_b, 9_999_999_999], b"hi").await.unwrap();

    let (b_read, _b_write) = b.into_split();
    let (b_tx, mut b_rx) = mpsc::channel(4);
    tokio::spawn(fanout_client::handle_incoming_messages(b_read, b_tx));

    let received = timeout(Duration::from_secs(2), b_rx.recv()).await.unwrap().unwrap();
    assert_eq!(received.body, b"hi");

    // No second message should ever arrive for the absent receiver id.
    let second = timeout(Duration::from_millis(200), b_rx.recv()).await;
    assert!(second.is_err(), "unexpected extra delivery");
}

#[tokio::test]
async fn duplicate_receivers_cause_duplicate_deliveries_in_order() {
    let (_server, addr) = spawn_server().await;
    let mut a = ClientSession::connect(addr).await.unwrap();
    let mut b = ClientSession::connect(addr).await.unwrap();

    let id_b = b.who_am_i().await.unwrap();
    a.who_am_i().await.unwrap();

    a.send_msg(&[id_b, id_b], b"twice").await.unwrap();

    let (b_read, _b_write) = b.into_split();
    let (b_tx, mut b_rx) = mpsc::channel(4);
    tokio::spawn(fanout_client::handle_incoming_messages(b_read, b_tx));

    let first = timeout(Duration::from_secs(2), b_rx.recv()).await.unwrap().unwrap();
    let second = timeout(Duration::from_secs(2), b_rx.recv()).await.unwrap().unwrap();
    assert_eq!(first.body, b"twice");
    assert_eq!(second.body, b"twice");
}

#[tokio::test]
async fn stop_closes_connections_and_reports_no_error_when_all_close_cleanly() {
    let (server, addr) = spawn_server().await;
    let mut client = ClientSession::connect(addr).await.unwrap();
    client.who_am_i().await.unwrap();

    assert_eq!(server.connection_count().await, 1);
    server.stop().await.unwrap();
    assert_eq!(server.connection_count().await, 0);

    let (read_half, _write_half) = client.into_split();
    let (tx, mut rx) = mpsc::channel(1);
    tokio::spawn(fanout_client::handle_incoming_messages(read_half, tx));
    assert!(rx.recv().await.is_none());
}
