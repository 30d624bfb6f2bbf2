//! Credential vault boundary.

use crate::error::Result;
use async_trait::async_trait;

/// Gate over the encrypted credential store.
///
/// The store itself (hashing, encryption, persistence) is an external
/// collaborator. This core treats it purely as a lock to be checked once at
/// startup and never inspects stored secret contents.
///
/// # Security Note
///
/// Implementations must keep secrets out of error messages and logs.
#[async_trait]
pub trait CredentialVault: Send + Sync {
    /// Whether a master password has ever been installed.
    async fn has_master_password(&self) -> Result<bool>;

    /// Whether the vault is currently unlocked.
    async fn is_unlocked(&self) -> bool;

    /// Installs the master password on first run.
    async fn set_master_password(&self, password: &str) -> Result<()>;

    /// Unlocks the vault with the master password.
    async fn unlock(&self, password: &str) -> Result<()>;
}
