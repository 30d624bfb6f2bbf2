//! In-memory collaborator fakes shared by unit and integration tests.

use async_trait::async_trait;
use skiff_core::error::{Result, SkiffError};
use skiff_core::session::{RemoteTarget, SessionId};
use skiff_core::surface::TerminalSurface;
use skiff_core::transport::{PtyTransport, TransportError};
use skiff_core::vault::CredentialVault;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// One recorded transport invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    ConnectLocal { id: SessionId, cols: u16, rows: u16 },
    ConnectRemote { id: SessionId, host: String },
    Write { id: SessionId, bytes: Vec<u8> },
    Resize { id: SessionId, cols: u16, rows: u16 },
    Disconnect { id: SessionId },
}

/// Transport fake that records every call and can fail the next call of a
/// given kind, or hold the next connect open to exercise in-flight races.
#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<TransportCall>>,
    next_connect_error: Mutex<Option<String>>,
    next_resize_error: Mutex<Option<String>>,
    next_disconnect_error: Mutex<Option<String>>,
    connect_gate: Mutex<Option<tokio::sync::oneshot::Receiver<()>>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_next_connect(&self, message: &str) {
        *self.next_connect_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_next_resize(&self, message: &str) {
        *self.next_resize_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_next_disconnect(&self, message: &str) {
        *self.next_disconnect_error.lock().unwrap() = Some(message.to_string());
    }

    /// Makes the next connect call block until the returned sender fires.
    pub fn hold_next_connect(&self) -> tokio::sync::oneshot::Sender<()> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        *self.connect_gate.lock().unwrap() = Some(rx);
        tx
    }

    async fn wait_for_gate(&self) {
        let gate = self.connect_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn connect_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| {
                matches!(
                    call,
                    TransportCall::ConnectLocal { .. } | TransportCall::ConnectRemote { .. }
                )
            })
            .count()
    }

    pub fn write_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, TransportCall::Write { .. }))
            .count()
    }

    pub fn resize_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, TransportCall::Resize { .. }))
            .count()
    }

    fn record(&self, call: TransportCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn take_error(slot: &Mutex<Option<String>>) -> Option<TransportError> {
        slot.lock().unwrap().take().map(TransportError::new)
    }
}

#[async_trait]
impl PtyTransport for RecordingTransport {
    async fn connect_local(
        &self,
        id: &SessionId,
        cols: u16,
        rows: u16,
    ) -> std::result::Result<(), TransportError> {
        self.record(TransportCall::ConnectLocal {
            id: id.clone(),
            cols,
            rows,
        });
        self.wait_for_gate().await;
        match Self::take_error(&self.next_connect_error) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn connect_remote(
        &self,
        id: &SessionId,
        target: &RemoteTarget,
    ) -> std::result::Result<(), TransportError> {
        self.record(TransportCall::ConnectRemote {
            id: id.clone(),
            host: target.host.clone(),
        });
        self.wait_for_gate().await;
        match Self::take_error(&self.next_connect_error) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn write(
        &self,
        id: &SessionId,
        bytes: &[u8],
    ) -> std::result::Result<(), TransportError> {
        self.record(TransportCall::Write {
            id: id.clone(),
            bytes: bytes.to_vec(),
        });
        Ok(())
    }

    async fn resize(
        &self,
        id: &SessionId,
        cols: u16,
        rows: u16,
    ) -> std::result::Result<(), TransportError> {
        self.record(TransportCall::Resize {
            id: id.clone(),
            cols,
            rows,
        });
        match Self::take_error(&self.next_resize_error) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn disconnect(&self, id: &SessionId) -> std::result::Result<(), TransportError> {
        self.record(TransportCall::Disconnect { id: id.clone() });
        match Self::take_error(&self.next_disconnect_error) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Surface fake: an append-only byte buffer plus a mutable grid size.
pub struct BufferSurface {
    bytes: Mutex<Vec<u8>>,
    grid: Mutex<(u16, u16)>,
}

impl BufferSurface {
    pub fn new(cols: u16, rows: u16) -> Arc<Self> {
        Arc::new(Self {
            bytes: Mutex::new(Vec::new()),
            grid: Mutex::new((cols, rows)),
        })
    }

    /// Buffered output, lossily decoded for assertions.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock().unwrap()).to_string()
    }

    pub fn set_grid(&self, cols: u16, rows: u16) {
        *self.grid.lock().unwrap() = (cols, rows);
    }
}

impl TerminalSurface for BufferSurface {
    fn write(&self, bytes: &[u8]) {
        self.bytes.lock().unwrap().extend_from_slice(bytes);
    }

    fn grid_size(&self) -> (u16, u16) {
        *self.grid.lock().unwrap()
    }
}

/// Vault fake with an in-memory master password.
#[derive(Default)]
pub struct MemoryVault {
    master: Mutex<Option<String>>,
    unlocked: AtomicBool,
}

impl MemoryVault {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl CredentialVault for MemoryVault {
    async fn has_master_password(&self) -> Result<bool> {
        Ok(self.master.lock().unwrap().is_some())
    }

    async fn is_unlocked(&self) -> bool {
        self.unlocked.load(Ordering::SeqCst)
    }

    async fn set_master_password(&self, password: &str) -> Result<()> {
        let mut master = self.master.lock().unwrap();
        if master.is_some() {
            return Err(SkiffError::vault("master password already set"));
        }
        *master = Some(password.to_string());
        drop(master);
        self.unlocked.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn unlock(&self, password: &str) -> Result<()> {
        let master = self.master.lock().unwrap();
        match master.as_deref() {
            Some(stored) if stored == password => {
                self.unlocked.store(true, Ordering::SeqCst);
                Ok(())
            }
            Some(_) => Err(SkiffError::vault("incorrect master password")),
            None => Err(SkiffError::vault("no master password set")),
        }
    }
}
