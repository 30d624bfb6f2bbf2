//! The transport collaborator boundary.
//!
//! The actual PTY spawning and SSH plumbing live in the host runtime. This
//! core only sees the asynchronous command surface below, plus a push event
//! stream: `Output` and `Disconnected` events arrive unordered across
//! sessions but ordered within one session.

use crate::session::{RemoteTarget, SessionId};
use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by the transport collaborator for a single call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Asynchronous command surface of the PTY/SSH transport.
///
/// All calls are non-blocking suspensions; none of them may be retried
/// automatically by this core.
#[async_trait]
pub trait PtyTransport: Send + Sync {
    /// Spawns a local shell for the session at the given geometry.
    async fn connect_local(
        &self,
        id: &SessionId,
        cols: u16,
        rows: u16,
    ) -> Result<(), TransportError>;

    /// Opens an SSH shell for the session. Credentials inside `target` are
    /// forwarded opaquely; the transport resolves stored references against
    /// the vault itself.
    async fn connect_remote(
        &self,
        id: &SessionId,
        target: &RemoteTarget,
    ) -> Result<(), TransportError>;

    /// Writes raw input bytes to the session's backing process.
    async fn write(&self, id: &SessionId, bytes: &[u8]) -> Result<(), TransportError>;

    /// Propagates a viewport geometry change to the backing process.
    async fn resize(&self, id: &SessionId, cols: u16, rows: u16) -> Result<(), TransportError>;

    /// Tears the session's connection down.
    async fn disconnect(&self, id: &SessionId) -> Result<(), TransportError>;
}

/// Events pushed by the transport collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Bytes emitted by the session's backing process.
    Output {
        session_id: SessionId,
        bytes: Vec<u8>,
    },
    /// The backing process or connection went away.
    Disconnected {
        session_id: SessionId,
        reason: String,
    },
}

impl TransportEvent {
    pub fn session_id(&self) -> &SessionId {
        match self {
            Self::Output { session_id, .. } | Self::Disconnected { session_id, .. } => session_id,
        }
    }
}
