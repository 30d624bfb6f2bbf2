//! The session registry.
//!
//! Owns the set of open tabs. All mutations (add/remove/select) are atomic
//! within one event-loop turn; asynchronous continuations elsewhere must
//! re-look sessions up by id before applying results.

use skiff_core::session::{ColorTag, ConnectionStatus, Session, SessionId, Target};
use skiff_core::surface::TerminalSurface;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use tokio::sync::RwLock;

/// Live state of one open tab.
///
/// Metadata is immutable. `status` has exactly one writer: the connection
/// state machine (`ConnectionManager`); everything else only reads it.
pub struct SessionHandle {
    session: Session,
    status: RwLock<ConnectionStatus>,
    /// Re-entrancy latch for connect attempts. Set synchronously before any
    /// asynchronous work and never reset, not even after a failed attempt:
    /// there is no transition out of `Error`, recovery is a new session.
    connect_latch: AtomicBool,
    surface: Arc<dyn TerminalSurface>,
    /// Last geometry forwarded to the transport; makes resize idempotent.
    last_geometry: StdMutex<Option<(u16, u16)>>,
}

impl SessionHandle {
    fn new(session: Session, surface: Arc<dyn TerminalSurface>) -> Self {
        Self {
            session,
            status: RwLock::new(ConnectionStatus::Disconnected),
            connect_latch: AtomicBool::new(false),
            surface,
            last_geometry: StdMutex::new(None),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.session.id
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn surface(&self) -> &Arc<dyn TerminalSurface> {
        &self.surface
    }

    pub async fn status(&self) -> ConnectionStatus {
        *self.status.read().await
    }

    /// Status mutation is reserved for the connection state machine.
    pub(crate) async fn set_status(&self, status: ConnectionStatus) {
        *self.status.write().await = status;
    }

    /// Tries to claim the one connect attempt this session gets. Synchronous
    /// by design: the caller must invoke this before its first suspension
    /// point so a duplicate trigger in the same turn cannot slip through.
    pub(crate) fn try_claim_connect(&self) -> bool {
        self.connect_latch
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Records the geometry about to be forwarded. Returns false when it
    /// matches the last forwarded value, in which case the resize is a no-op.
    pub(crate) fn record_geometry(&self, geometry: (u16, u16)) -> bool {
        let mut last = self.last_geometry.lock().expect("geometry lock poisoned");
        if *last == Some(geometry) {
            return false;
        }
        *last = Some(geometry);
        true
    }
}

/// Owns all open sessions and the active-tab pointer.
///
/// Invariants: a session id is never reused (v4 ids), and the active
/// pointer always refers to a live entry or is empty.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<SessionHandle>>>,
    active: RwLock<Option<SessionId>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session for a target and registers it as the active tab.
    pub async fn open(
        &self,
        target: Target,
        label: impl Into<String>,
        color: ColorTag,
        surface: Arc<dyn TerminalSurface>,
    ) -> Arc<SessionHandle> {
        let session = Session::new(target, label, color);
        let id = session.id.clone();
        tracing::info!(
            "[Registry] opening session {} ({})",
            id,
            session.target.describe()
        );

        let handle = Arc::new(SessionHandle::new(session, surface));
        self.sessions.write().await.insert(id.clone(), handle.clone());
        *self.active.write().await = Some(id);
        handle
    }

    pub async fn get(&self, id: &SessionId) -> Option<Arc<SessionHandle>> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn contains(&self, id: &SessionId) -> bool {
        self.sessions.read().await.contains_key(id)
    }

    /// Removes a session, clearing the active pointer if it pointed here.
    pub async fn remove(&self, id: &SessionId) -> Option<Arc<SessionHandle>> {
        let removed = self.sessions.write().await.remove(id);
        if removed.is_some() {
            let mut active = self.active.write().await;
            if active.as_ref() == Some(id) {
                *active = None;
            }
        }
        removed
    }

    /// Selects the active tab. Refuses ids that are not live.
    pub async fn activate(&self, id: &SessionId) -> bool {
        if !self.contains(id).await {
            return false;
        }
        *self.active.write().await = Some(id.clone());
        true
    }

    pub async fn active_session_id(&self) -> Option<SessionId> {
        self.active.read().await.clone()
    }

    pub async fn active_session(&self) -> Option<Arc<SessionHandle>> {
        let id = self.active.read().await.clone()?;
        self.get(&id).await
    }

    pub async fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.read().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
