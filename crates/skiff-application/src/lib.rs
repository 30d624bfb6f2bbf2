//! Live session machinery for Skiff.
//!
//! The session registry owns the set of open tabs; each tab gets a
//! connection state machine and an I/O router scoped to it. The event pump
//! fans the transport collaborator's push stream out to them. `bootstrap`
//! is the composition root the host runtime calls once at startup.

pub mod bootstrap;
pub mod connection;
pub mod pump;
pub mod registry;
pub mod router;
pub mod test_support;

pub use bootstrap::{bootstrap, AppServices, VaultState};
pub use connection::ConnectionManager;
pub use pump::EventPump;
pub use registry::{SessionHandle, SessionRegistry};
pub use router::IoRouter;

// Re-export the shared result type; everything here fails with SkiffError.
pub use skiff_core::error::Result;
