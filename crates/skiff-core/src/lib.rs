//! Domain model and collaborator boundaries for Skiff.
//!
//! This crate holds the data types shared by the workspace and the traits
//! behind which the host runtime's collaborators live: the PTY/SSH
//! transport, the credential vault, and the terminal display surface.

pub mod ai;
pub mod config;
pub mod error;
pub mod session;
pub mod surface;
pub mod transport;
pub mod vault;

pub use ai::{AiRequest, AiResponse};
pub use config::{ProviderConfig, ProviderId, SavedTarget, Settings};
pub use error::{Result, SkiffError};
pub use session::{
    AuthMethod, ColorTag, ConnectionStatus, RemoteTarget, Secret, Session, SessionId,
    StoredAuthKind, Target,
};
pub use surface::TerminalSurface;
pub use transport::{PtyTransport, TransportError, TransportEvent};
pub use vault::CredentialVault;
