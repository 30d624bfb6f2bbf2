//! The per-session connection state machine.
//!
//! `Disconnected → Connecting → Connected`, with `Error` reachable from
//! `Connecting` (failed connect) or `Connected` (asynchronous disconnect
//! push). `Error` is terminal. Connection problems are local to one
//! session and never touch the others.

use crate::registry::{SessionHandle, SessionRegistry};
use crate::router::IoRouter;
use skiff_core::session::{ConnectionStatus, SessionId, Target};
use skiff_core::surface::TerminalSurface;
use skiff_core::transport::PtyTransport;
use std::sync::Arc;

/// Drives connect, teardown and out-of-band disconnect handling.
///
/// The only writer of session status.
pub struct ConnectionManager {
    registry: Arc<SessionRegistry>,
    transport: Arc<dyn PtyTransport>,
}

impl ConnectionManager {
    pub fn new(registry: Arc<SessionRegistry>, transport: Arc<dyn PtyTransport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// Drives the connect handshake for a freshly opened session.
    ///
    /// The connect latch is claimed before the first suspension point, so a
    /// rapid duplicate trigger (re-render, duplicate event) issues exactly
    /// one transport connect call. The latch stays claimed after a failure;
    /// recovery means opening a new session.
    pub async fn connect(&self, handle: Arc<SessionHandle>) {
        if !handle.try_claim_connect() {
            tracing::debug!(
                "[Connection] duplicate connect trigger for session {} ignored",
                handle.id()
            );
            return;
        }

        handle.set_status(ConnectionStatus::Connecting).await;
        let id = handle.id().clone();
        let (cols, rows) = handle.surface().grid_size();

        let result = match handle.session().target.clone() {
            Target::Local => self.transport.connect_local(&id, cols.max(1), rows.max(1)).await,
            Target::Remote(remote) => self.transport.connect_remote(&id, &remote).await,
        };

        // The session may have been closed while the connect was in flight;
        // look it up again by id rather than trusting the captured handle.
        let Some(handle) = self.registry.get(&id).await else {
            tracing::debug!(
                "[Connection] discarding connect result for closed session {}",
                id
            );
            return;
        };

        match result {
            Ok(()) => {
                handle.set_status(ConnectionStatus::Connected).await;
                tracing::info!("[Connection] session {} connected", id);

                // The surface may not have had its final size until it was
                // laid out; sync once right after connect.
                IoRouter::new(handle, self.transport.clone())
                    .sync_geometry()
                    .await;
            }
            Err(err) => {
                handle.set_status(ConnectionStatus::Error).await;
                tracing::warn!("[Connection] session {} failed to connect: {}", id, err);
                write_diagnostic(handle.surface(), &format!("connection failed: {err}"));
            }
        }
    }

    /// Applies an out-of-band disconnect notification pushed by the
    /// transport. A stale id (session already closed) is a benign teardown
    /// race and is ignored without error.
    pub async fn handle_disconnected(&self, id: &SessionId, reason: &str) {
        let Some(handle) = self.registry.get(id).await else {
            tracing::debug!(
                "[Connection] disconnect event for unknown session {} ignored",
                id
            );
            return;
        };

        handle.set_status(ConnectionStatus::Error).await;
        tracing::warn!("[Connection] session {} disconnected: {}", id, reason);
        write_diagnostic(handle.surface(), &format!("disconnected: {reason}"));
    }

    /// Closes a session: removes it from the registry first, then issues a
    /// best-effort disconnect. A failed disconnect is only logged; the
    /// session is being torn down regardless.
    pub async fn close(&self, id: &SessionId) {
        let Some(handle) = self.registry.remove(id).await else {
            tracing::debug!("[Connection] close for unknown session {} ignored", id);
            return;
        };

        tracing::info!("[Connection] closing session {}", id);
        if handle.status().await.is_connected() {
            if let Err(err) = self.transport.disconnect(id).await {
                tracing::warn!(
                    "[Connection] disconnect for closing session {} failed (ignored): {}",
                    id,
                    err
                );
            }
        }
    }
}

/// Writes an inline diagnostic line into a session's display surface.
fn write_diagnostic(surface: &Arc<dyn TerminalSurface>, message: &str) {
    surface.write(format!("\r\n[skiff] {message}\r\n").as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{BufferSurface, RecordingTransport, TransportCall};
    use skiff_core::session::{AuthMethod, ColorTag, RemoteTarget, Secret};

    fn remote_target() -> Target {
        Target::Remote(RemoteTarget {
            host: "db1.example.com".to_string(),
            port: 22,
            username: "ops".to_string(),
            auth: AuthMethod::Password {
                secret: Secret::new("hunter2"),
            },
        })
    }

    async fn setup() -> (Arc<SessionRegistry>, Arc<RecordingTransport>, ConnectionManager) {
        let registry = Arc::new(SessionRegistry::new());
        let transport = RecordingTransport::new();
        let manager = ConnectionManager::new(registry.clone(), transport.clone());
        (registry, transport, manager)
    }

    #[tokio::test]
    async fn test_successful_connect_reaches_connected() {
        let (registry, transport, manager) = setup().await;
        let handle = registry
            .open(Target::Local, "tab", ColorTag::default(), BufferSurface::new(80, 24))
            .await;

        manager.connect(handle.clone()).await;

        assert_eq!(handle.status().await, ConnectionStatus::Connected);
        assert_eq!(transport.connect_calls(), 1);
        // Post-connect geometry sync went out exactly once.
        assert_eq!(transport.resize_calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_connect_reaches_error_with_diagnostic() {
        let (registry, transport, manager) = setup().await;
        transport.fail_next_connect("host unreachable");
        let surface = BufferSurface::new(80, 24);
        let handle = registry
            .open(remote_target(), "db", ColorTag::Rose, surface.clone())
            .await;

        manager.connect(handle.clone()).await;

        assert_eq!(handle.status().await, ConnectionStatus::Error);
        assert!(surface.contents().contains("connection failed"));
        assert!(surface.contents().contains("host unreachable"));
    }

    #[tokio::test]
    async fn test_double_trigger_issues_one_transport_call() {
        let (registry, transport, manager) = setup().await;
        let handle = registry
            .open(Target::Local, "tab", ColorTag::default(), BufferSurface::new(80, 24))
            .await;

        manager.connect(handle.clone()).await;
        manager.connect(handle.clone()).await;

        assert_eq!(transport.connect_calls(), 1);
    }

    #[tokio::test]
    async fn test_async_disconnect_drives_connected_session_to_error() {
        let (registry, _transport, manager) = setup().await;
        let handle = registry
            .open(Target::Local, "tab", ColorTag::default(), BufferSurface::new(80, 24))
            .await;
        manager.connect(handle.clone()).await;

        manager
            .handle_disconnected(handle.id(), "connection reset by peer")
            .await;

        assert_eq!(handle.status().await, ConnectionStatus::Error);
    }

    #[tokio::test]
    async fn test_stale_disconnect_leaves_other_sessions_alone() {
        let (registry, _transport, manager) = setup().await;
        let survivor = registry
            .open(Target::Local, "tab", ColorTag::default(), BufferSurface::new(80, 24))
            .await;
        manager.connect(survivor.clone()).await;

        let closed = registry
            .open(Target::Local, "gone", ColorTag::default(), BufferSurface::new(80, 24))
            .await;
        let closed_id = closed.id().clone();
        registry.remove(&closed_id).await;
        drop(closed);

        manager.handle_disconnected(&closed_id, "late event").await;

        assert_eq!(survivor.status().await, ConnectionStatus::Connected);
    }

    #[tokio::test]
    async fn test_close_issues_best_effort_disconnect() {
        let (registry, transport, manager) = setup().await;
        let handle = registry
            .open(Target::Local, "tab", ColorTag::default(), BufferSurface::new(80, 24))
            .await;
        manager.connect(handle.clone()).await;
        let id = handle.id().clone();

        manager.close(&id).await;

        assert!(!registry.contains(&id).await);
        assert!(transport
            .calls()
            .iter()
            .any(|call| matches!(call, TransportCall::Disconnect { id: did } if *did == id)));
    }

    #[tokio::test]
    async fn test_close_of_unconnected_session_skips_disconnect() {
        let (registry, transport, manager) = setup().await;
        let handle = registry
            .open(Target::Local, "tab", ColorTag::default(), BufferSurface::new(80, 24))
            .await;
        let id = handle.id().clone();

        manager.close(&id).await;

        assert!(!transport
            .calls()
            .iter()
            .any(|call| matches!(call, TransportCall::Disconnect { .. })));
    }

    #[tokio::test]
    async fn test_failing_teardown_disconnect_is_swallowed() {
        let (registry, transport, manager) = setup().await;
        let handle = registry
            .open(Target::Local, "tab", ColorTag::default(), BufferSurface::new(80, 24))
            .await;
        manager.connect(handle.clone()).await;
        let id = handle.id().clone();

        transport.fail_next_disconnect("already gone");
        manager.close(&id).await;

        // No panic, session removed; failure only logged.
        assert!(!registry.contains(&id).await);
    }

    #[tokio::test]
    async fn test_connect_result_is_discarded_when_session_closes_mid_flight() {
        let (registry, transport, manager) = setup().await;
        let gate = transport.hold_next_connect();
        let handle = registry
            .open(Target::Local, "tab", ColorTag::default(), BufferSurface::new(80, 24))
            .await;
        let id = handle.id().clone();

        let manager = Arc::new(manager);
        let connect_task = tokio::spawn({
            let manager = manager.clone();
            let handle = handle.clone();
            async move { manager.connect(handle).await }
        });

        // Let the attempt reach the transport, then close the session
        // underneath it. There is no cancellation of the in-flight connect.
        tokio::task::yield_now().await;
        assert_eq!(handle.status().await, ConnectionStatus::Connecting);
        registry.remove(&id).await;

        gate.send(()).unwrap();
        connect_task.await.unwrap();

        // The resolved attempt found its session gone and discarded the
        // result: the status never advanced past Connecting.
        assert_eq!(handle.status().await, ConnectionStatus::Connecting);
        assert_eq!(transport.resize_calls(), 0);
    }

    #[tokio::test]
    async fn test_remote_connect_forwards_target() {
        let (registry, transport, manager) = setup().await;
        let handle = registry
            .open(remote_target(), "db", ColorTag::default(), BufferSurface::new(80, 24))
            .await;

        manager.connect(handle.clone()).await;

        assert!(transport.calls().iter().any(|call| matches!(
            call,
            TransportCall::ConnectRemote { host, .. } if host == "db1.example.com"
        )));
    }
}
