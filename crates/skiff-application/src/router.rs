//! The per-session I/O router.
//!
//! A bidirectional byte pump between one session's display surface and the
//! transport collaborator, plus viewport geometry sync. Each router is
//! scoped to exactly one session; no shared mutable buffer crosses
//! sessions.

use crate::registry::SessionHandle;
use skiff_core::session::SessionId;
use skiff_core::transport::{PtyTransport, TransportEvent};
use std::sync::Arc;

pub struct IoRouter {
    handle: Arc<SessionHandle>,
    transport: Arc<dyn PtyTransport>,
}

impl IoRouter {
    pub fn new(handle: Arc<SessionHandle>, transport: Arc<dyn PtyTransport>) -> Self {
        Self { handle, transport }
    }

    pub fn session_id(&self) -> &SessionId {
        self.handle.id()
    }

    /// Inbound: applies output events in arrival order, demultiplexed by
    /// session id. Events for other sessions are ignored here; their own
    /// routers handle them, and background tabs keep buffering while
    /// hidden.
    pub fn handle_output(&self, event: &TransportEvent) {
        let TransportEvent::Output { session_id, bytes } = event else {
            return;
        };
        if session_id != self.handle.id() {
            return;
        }
        self.handle.surface().write(bytes);
    }

    /// Outbound: forwards input to the transport only while the session is
    /// connected. Input arriving in any other state is dropped, not queued;
    /// a warning is the only observable effect. Keystrokes are never
    /// logged, only their byte count.
    pub async fn handle_input(&self, bytes: &[u8]) {
        let status = self.handle.status().await;
        if !status.is_connected() {
            tracing::warn!(
                "[IoRouter] dropping {} input bytes for session {}: status {}",
                bytes.len(),
                self.handle.id(),
                status
            );
            return;
        }

        if let Err(err) = self.transport.write(self.handle.id(), bytes).await {
            tracing::warn!(
                "[IoRouter] write to session {} failed: {}",
                self.handle.id(),
                err
            );
        }
    }

    /// Recomputes the surface's row/column count and forwards it.
    /// Fire-and-forget: a no-op when the geometry matches what was last
    /// sent (a resize racing the connect must tolerate this), and failures
    /// are logged only.
    pub async fn sync_geometry(&self) {
        let (cols, rows) = self.handle.surface().grid_size();
        let geometry = (cols.max(1), rows.max(1));

        if !self.handle.record_geometry(geometry) {
            tracing::debug!(
                "[IoRouter] geometry for session {} unchanged, skipping resize",
                self.handle.id()
            );
            return;
        }

        if let Err(err) = self
            .transport
            .resize(self.handle.id(), geometry.0, geometry.1)
            .await
        {
            tracing::warn!(
                "[IoRouter] resize for session {} failed (ignored): {}",
                self.handle.id(),
                err
            );
        }
    }
}
