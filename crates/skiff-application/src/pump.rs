//! The transport event pump.
//!
//! Consumes the collaborator's push stream and fans events out: output to
//! the owning session's router, disconnect notifications to the state
//! machine. Events for session ids that are no longer registered are
//! dropped without error; they are a benign race between teardown and
//! in-flight events.

use crate::connection::ConnectionManager;
use crate::registry::SessionRegistry;
use crate::router::IoRouter;
use skiff_core::transport::{PtyTransport, TransportEvent};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

pub struct EventPump {
    registry: Arc<SessionRegistry>,
    connections: Arc<ConnectionManager>,
    transport: Arc<dyn PtyTransport>,
}

impl EventPump {
    pub fn new(
        registry: Arc<SessionRegistry>,
        connections: Arc<ConnectionManager>,
        transport: Arc<dyn PtyTransport>,
    ) -> Self {
        Self {
            registry,
            connections,
            transport,
        }
    }

    /// Drains the event stream until the transport closes it. Events are
    /// applied sequentially, preserving the per-session order the
    /// collaborator emits.
    pub async fn run(&self, mut events: UnboundedReceiver<TransportEvent>) {
        while let Some(event) = events.recv().await {
            self.dispatch(event).await;
        }
        tracing::info!("[EventPump] transport event stream closed");
    }

    /// Routes a single event.
    pub async fn dispatch(&self, event: TransportEvent) {
        match &event {
            TransportEvent::Output { session_id, .. } => {
                let Some(handle) = self.registry.get(session_id).await else {
                    tracing::debug!(
                        "[EventPump] output for unknown session {} dropped",
                        session_id
                    );
                    return;
                };
                IoRouter::new(handle, self.transport.clone()).handle_output(&event);
            }
            TransportEvent::Disconnected { session_id, reason } => {
                self.connections.handle_disconnected(session_id, reason).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{BufferSurface, RecordingTransport};
    use skiff_core::session::{ColorTag, ConnectionStatus, SessionId, Target};

    async fn setup() -> (Arc<SessionRegistry>, Arc<RecordingTransport>, EventPump) {
        let registry = Arc::new(SessionRegistry::new());
        let transport = RecordingTransport::new();
        let connections = Arc::new(ConnectionManager::new(registry.clone(), transport.clone()));
        let pump = EventPump::new(registry.clone(), connections, transport.clone());
        (registry, transport, pump)
    }

    #[tokio::test]
    async fn test_output_reaches_only_the_owning_session() {
        let (registry, _transport, pump) = setup().await;
        let surface_a = BufferSurface::new(80, 24);
        let surface_b = BufferSurface::new(80, 24);
        let a = registry
            .open(Target::Local, "a", ColorTag::default(), surface_a.clone())
            .await;
        let _b = registry
            .open(Target::Local, "b", ColorTag::default(), surface_b.clone())
            .await;

        pump.dispatch(TransportEvent::Output {
            session_id: a.id().clone(),
            bytes: b"for a only".to_vec(),
        })
        .await;

        assert_eq!(surface_a.contents(), "for a only");
        assert_eq!(surface_b.contents(), "");
    }

    #[tokio::test]
    async fn test_output_for_closed_session_is_dropped() {
        let (registry, _transport, pump) = setup().await;
        let handle = registry
            .open(Target::Local, "a", ColorTag::default(), BufferSurface::new(80, 24))
            .await;
        let id = handle.id().clone();
        registry.remove(&id).await;

        // Must not panic or error.
        pump.dispatch(TransportEvent::Output {
            session_id: id,
            bytes: b"late".to_vec(),
        })
        .await;
    }

    #[tokio::test]
    async fn test_disconnect_event_reaches_the_state_machine() {
        let (registry, _transport, pump) = setup().await;
        let handle = registry
            .open(Target::Local, "a", ColorTag::default(), BufferSurface::new(80, 24))
            .await;
        handle.set_status(ConnectionStatus::Connected).await;

        pump.dispatch(TransportEvent::Disconnected {
            session_id: handle.id().clone(),
            reason: "shell exited".to_string(),
        })
        .await;

        assert_eq!(handle.status().await, ConnectionStatus::Error);
    }

    #[tokio::test]
    async fn test_disconnect_for_unknown_session_is_ignored() {
        let (_registry, _transport, pump) = setup().await;

        pump.dispatch(TransportEvent::Disconnected {
            session_id: SessionId::generate(),
            reason: "late".to_string(),
        })
        .await;
    }
}
