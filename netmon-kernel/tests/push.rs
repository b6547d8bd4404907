use futures_util::StreamExt;
use netmon_devkit::{SnapshotBuilder, TestHarness};
use netmon_kernel::http::build_router;
use netmon_kernel::scanner::ScanRunner;
use netmon_kernel::snapshot::SnapshotStore;
use netmon_kernel::state::AppState;
use netmon_kernel::watcher::spawn_snapshot_watcher;
use serde_json::Value;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn serve(harness: &TestHarness) -> (AppState, SocketAddr) {
    let store = SnapshotStore::new(harness.snapshot_path());
    let scanner = ScanRunner::from_command_line("true", None).unwrap();
    let state = AppState::new(store, scanner, Duration::from_millis(20));
    spawn_snapshot_watcher(state.store.path(), state.broadcaster.clone(), state.lifecycle.token()).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(state.clone(), harness.dir());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (state, addr)
}

async fn connect(addr: SocketAddr, path: &str) -> Client {
    let (client, _) = connect_async(format!("ws://{addr}{path}")).await.unwrap();
    client
}

async fn next_update(client: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("no frame in time")
            .expect("connection closed")
            .unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn wait_for_clients(state: &AppState, expected: usize) {
    for _ in 0..100 {
        if state.registry.len() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("expected {expected} connections, have {}", state.registry.len());
}

#[tokio::test]
async fn test_dashboard_path_receives_current_snapshot_once() {
    let harness = TestHarness::new().unwrap();
    let doc = SnapshotBuilder::new().host("10.0.0.5", "tv1").build();
    harness.write_snapshot(&doc).unwrap();
    let (_state, addr) = serve(&harness).await;

    let mut client = connect(addr, "/").await;
    let first = next_update(&mut client).await;
    assert_eq!(first["type"], "network_update");
    assert_eq!(first["data"], doc);
    assert!(first["timestamp"].is_string());

    let extra = tokio::time::timeout(Duration::from_millis(300), client.next()).await;
    assert!(extra.is_err(), "unexpected second frame before any change");
}

#[tokio::test]
async fn test_no_initial_frame_without_snapshot() {
    let harness = TestHarness::new().unwrap();
    let (state, addr) = serve(&harness).await;

    let mut client = connect(addr, "/ws").await;
    wait_for_clients(&state, 1).await;
    let frame = tokio::time::timeout(Duration::from_millis(300), client.next()).await;
    assert!(frame.is_err());
}

#[tokio::test]
async fn test_snapshot_rewrite_reaches_every_client() {
    let harness = TestHarness::new().unwrap();
    harness.write_snapshot(&SnapshotBuilder::new().host("10.0.0.5", "tv1").build()).unwrap();
    let (state, addr) = serve(&harness).await;

    let mut a = connect(addr, "/").await;
    let mut b = connect(addr, "/ws").await;
    next_update(&mut a).await;
    next_update(&mut b).await;
    wait_for_clients(&state, 2).await;

    let fresh = SnapshotBuilder::new()
        .host("10.0.0.5", "tv1")
        .host("10.0.0.42", "gaming-pc")
        .build();
    harness.write_snapshot(&fresh).unwrap();

    // le watcher peut émettre plusieurs événements pour une écriture
    for client in [&mut a, &mut b] {
        loop {
            let update = next_update(client).await;
            assert_eq!(update["type"], "network_update");
            if update["data"] == fresh {
                break;
            }
        }
    }

    a.close(None).await.unwrap();
    wait_for_clients(&state, 1).await;

    state.lifecycle.shutdown(&state.registry);
    loop {
        match tokio::time::timeout(Duration::from_secs(5), b.next()).await.expect("no close in time") {
            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
            Some(Ok(_)) => continue,
        }
    }
    wait_for_clients(&state, 0).await;
}
