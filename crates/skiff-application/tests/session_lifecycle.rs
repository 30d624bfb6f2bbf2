//! End-to-end session lifecycle: two concurrent tabs, output demux, tab
//! switching and teardown isolation.

use skiff_application::test_support::{BufferSurface, MemoryVault, RecordingTransport};
use skiff_application::{bootstrap, AppServices};
use skiff_core::session::{ColorTag, ConnectionStatus, Target};
use skiff_core::transport::TransportEvent;
use skiff_infrastructure::SettingsStore;
use std::sync::Arc;
use tempfile::TempDir;

async fn services(dir: &TempDir) -> (AppServices, Arc<RecordingTransport>) {
    let transport = RecordingTransport::new();
    let store = SettingsStore::with_path(dir.path().join("settings.toml"));
    let services = bootstrap(transport.clone(), MemoryVault::new(), store)
        .await
        .unwrap();
    (services, transport)
}

#[tokio::test]
async fn test_two_sessions_are_fully_isolated() {
    let dir = TempDir::new().unwrap();
    let (services, _transport) = services(&dir).await;

    let surface_a = BufferSurface::new(80, 24);
    let surface_b = BufferSurface::new(80, 24);

    let a = services
        .registry
        .open(Target::Local, "tab a", ColorTag::Ocean, surface_a.clone())
        .await;
    let b = services
        .registry
        .open(Target::Local, "tab b", ColorTag::Moss, surface_b.clone())
        .await;

    services.connections.connect(a.clone()).await;
    services.connections.connect(b.clone()).await;
    assert_eq!(a.status().await, ConnectionStatus::Connected);
    assert_eq!(b.status().await, ConnectionStatus::Connected);

    // Output for A lands only on A's surface; B stays untouched.
    services
        .pump
        .dispatch(TransportEvent::Output {
            session_id: a.id().clone(),
            bytes: b"a$ uptime\r\n".to_vec(),
        })
        .await;
    assert_eq!(surface_a.contents(), "a$ uptime\r\n");
    assert_eq!(surface_b.contents(), "");

    // Switch the active tab to B, then close A.
    assert!(services.registry.activate(b.id()).await);
    services.connections.close(a.id()).await;

    // B's status, buffer and active selection are unaffected.
    assert_eq!(b.status().await, ConnectionStatus::Connected);
    assert_eq!(surface_b.contents(), "");
    assert_eq!(services.registry.active_session_id().await.as_ref(), Some(b.id()));

    // A late output event for the closed session is dropped without error.
    services
        .pump
        .dispatch(TransportEvent::Output {
            session_id: a.id().clone(),
            bytes: b"too late".to_vec(),
        })
        .await;
    assert_eq!(surface_a.contents(), "a$ uptime\r\n");
}

#[tokio::test]
async fn test_connect_failure_is_local_to_one_session() {
    let dir = TempDir::new().unwrap();
    let (services, transport) = services(&dir).await;

    let healthy = services
        .registry
        .open(Target::Local, "ok", ColorTag::default(), BufferSurface::new(80, 24))
        .await;
    services.connections.connect(healthy.clone()).await;

    let surface = BufferSurface::new(80, 24);
    let doomed = services
        .registry
        .open(Target::Local, "broken", ColorTag::default(), surface.clone())
        .await;
    transport.fail_next_connect("spawn failed");
    services.connections.connect(doomed.clone()).await;

    assert_eq!(doomed.status().await, ConnectionStatus::Error);
    assert!(surface.contents().contains("connection failed"));
    assert_eq!(healthy.status().await, ConnectionStatus::Connected);
}

#[tokio::test]
async fn test_async_disconnect_only_hits_its_own_session() {
    let dir = TempDir::new().unwrap();
    let (services, _transport) = services(&dir).await;

    let a = services
        .registry
        .open(Target::Local, "a", ColorTag::default(), BufferSurface::new(80, 24))
        .await;
    let b = services
        .registry
        .open(Target::Local, "b", ColorTag::default(), BufferSurface::new(80, 24))
        .await;
    services.connections.connect(a.clone()).await;
    services.connections.connect(b.clone()).await;

    services
        .pump
        .dispatch(TransportEvent::Disconnected {
            session_id: a.id().clone(),
            reason: "connection reset".to_string(),
        })
        .await;

    assert_eq!(a.status().await, ConnectionStatus::Error);
    assert_eq!(b.status().await, ConnectionStatus::Connected);
}

#[tokio::test]
async fn test_pump_run_drains_the_stream_in_order() {
    let dir = TempDir::new().unwrap();
    let (services, _transport) = services(&dir).await;

    let surface = BufferSurface::new(80, 24);
    let session = services
        .registry
        .open(Target::Local, "tab", ColorTag::default(), surface.clone())
        .await;
    services.connections.connect(session.clone()).await;

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    for chunk in [&b"one "[..], &b"two "[..], &b"three"[..]] {
        tx.send(TransportEvent::Output {
            session_id: session.id().clone(),
            bytes: chunk.to_vec(),
        })
        .unwrap();
    }
    drop(tx);

    services.pump.run(rx).await;

    // Applied in arrival order, no reordering or coalescing.
    assert_eq!(surface.contents(), "one two three");
}
