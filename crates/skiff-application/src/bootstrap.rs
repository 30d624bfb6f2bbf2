//! Composition root.
//!
//! Wires the collaborators (transport, credential vault, settings store)
//! into the live services. The credential vault is treated purely as an
//! opaque gate checked once at startup; stored secret contents are never
//! inspected here.

use crate::connection::ConnectionManager;
use crate::pump::EventPump;
use crate::registry::SessionRegistry;
use anyhow::{Context, Result};
use skiff_core::ai::{AiRequest, AiResponse};
use skiff_core::config::{ProviderConfig, Settings};
use skiff_core::vault::CredentialVault;
use skiff_core::transport::PtyTransport;
use skiff_infrastructure::SettingsStore;
use skiff_interaction::AiGateway;
use std::sync::Arc;
use tokio::sync::RwLock;

/// What the startup vault check found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultState {
    /// No master password installed yet; first run.
    FirstRun,
    /// Master password exists, vault not yet unlocked.
    Locked,
    /// Ready for use.
    Unlocked,
}

/// Application services shared with the host runtime's command layer.
pub struct AppServices {
    pub registry: Arc<SessionRegistry>,
    pub connections: Arc<ConnectionManager>,
    pub pump: Arc<EventPump>,
    pub gateway: Arc<AiGateway>,
    pub vault: Arc<dyn CredentialVault>,
    settings: RwLock<Settings>,
    store: SettingsStore,
}

impl AppServices {
    /// Re-checks the vault gate.
    pub async fn vault_state(&self) -> crate::Result<VaultState> {
        if !self.vault.has_master_password().await? {
            return Ok(VaultState::FirstRun);
        }
        if self.vault.is_unlocked().await {
            return Ok(VaultState::Unlocked);
        }
        Ok(VaultState::Locked)
    }

    /// Opens the vault gate: installs the master password on first run,
    /// unlocks with it afterwards.
    pub async fn unlock_vault(&self, password: &str) -> crate::Result<()> {
        if !self.vault.has_master_password().await? {
            tracing::info!("[Bootstrap] first run, installing master password");
            return self.vault.set_master_password(password).await;
        }
        self.vault.unlock(password).await
    }

    /// A snapshot of the current settings.
    pub async fn settings(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Applies a settings change and persists it immediately, the
    /// save-on-change hook.
    pub async fn update_settings<F>(&self, apply: F) -> crate::Result<Settings>
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.settings.write().await;
        apply(&mut settings);
        self.store.save(&settings)?;
        Ok(settings.clone())
    }

    /// Free-form assistant query, using the request's provider selection
    /// and that provider's stored configuration.
    pub async fn ask_assistant(&self, request: &AiRequest) -> AiResponse {
        let config = self.config_for(&request.provider).await;
        self.gateway.ask(request, &config).await
    }

    /// Auto-corrects a candidate command line; falls back to the settings
    /// default provider when none is selected.
    pub async fn correct_command(&self, command_line: &str, provider: Option<&str>) -> AiResponse {
        let provider = match provider {
            Some(explicit) => explicit.to_string(),
            None => self.settings.read().await.default_provider.to_string(),
        };
        let config = self.config_for(&provider).await;
        self.gateway
            .correct_command(command_line, &provider, &config)
            .await
    }

    async fn config_for(&self, provider: &str) -> ProviderConfig {
        match provider.parse() {
            Ok(id) => self.settings.read().await.provider_config(id),
            // Unknown id: the gateway produces the diagnostic; any config
            // will do.
            Err(_) => ProviderConfig::default(),
        }
    }
}

/// Assembles the application. Settings load here, once, at startup; the
/// caller spawns [`EventPump::run`] on the transport's event stream.
pub async fn bootstrap(
    transport: Arc<dyn PtyTransport>,
    vault: Arc<dyn CredentialVault>,
    store: SettingsStore,
) -> Result<AppServices> {
    let settings = store
        .load()
        .context("failed to load settings at startup")?;
    tracing::info!(
        "[Bootstrap] settings loaded, default provider: {}",
        settings.default_provider
    );

    // Vault gate, checked once. The actual password comes from the user
    // later via unlock_vault.
    let vault_ready = vault.has_master_password().await.map(|installed| {
        if !installed {
            "first run"
        } else {
            "installed"
        }
    });
    match vault_ready {
        Ok(state) => tracing::info!("[Bootstrap] credential vault: {}", state),
        Err(err) => tracing::warn!("[Bootstrap] credential vault check failed: {}", err),
    }

    let registry = Arc::new(SessionRegistry::new());
    let connections = Arc::new(ConnectionManager::new(registry.clone(), transport.clone()));
    let pump = Arc::new(EventPump::new(
        registry.clone(),
        connections.clone(),
        transport,
    ));
    let gateway = Arc::new(AiGateway::with_default_providers());

    Ok(AppServices {
        registry,
        connections,
        pump,
        gateway,
        vault,
        settings: RwLock::new(settings),
        store,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryVault, RecordingTransport};
    use skiff_core::config::ProviderId;
    use tempfile::TempDir;

    async fn services_in(dir: &TempDir) -> AppServices {
        let store = SettingsStore::with_path(dir.path().join("settings.toml"));
        bootstrap(RecordingTransport::new(), MemoryVault::new(), store)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_vault_gate_first_run_then_unlocked() {
        let dir = TempDir::new().unwrap();
        let services = services_in(&dir).await;

        assert_eq!(services.vault_state().await.unwrap(), VaultState::FirstRun);
        services.unlock_vault("master-pw").await.unwrap();
        assert_eq!(services.vault_state().await.unwrap(), VaultState::Unlocked);
    }

    #[tokio::test]
    async fn test_vault_rejects_wrong_password() {
        let dir = TempDir::new().unwrap();
        let services = services_in(&dir).await;
        services.unlock_vault("master-pw").await.unwrap();

        assert!(services.unlock_vault("wrong").await.is_err());
    }

    #[tokio::test]
    async fn test_update_settings_persists_to_disk() {
        let dir = TempDir::new().unwrap();
        let services = services_in(&dir).await;

        services
            .update_settings(|settings| settings.default_provider = ProviderId::Gemini)
            .await
            .unwrap();

        // A fresh bootstrap sees the change: load-at-startup reads what
        // save-on-change wrote.
        let reloaded = services_in(&dir).await;
        assert_eq!(
            reloaded.settings().await.default_provider,
            ProviderId::Gemini
        );
    }

    #[tokio::test]
    async fn test_unknown_provider_query_gets_a_diagnostic() {
        let dir = TempDir::new().unwrap();
        let services = services_in(&dir).await;

        let response = services
            .ask_assistant(&AiRequest {
                query: "hello".to_string(),
                context_snippet: String::new(),
                provider: "copilot".to_string(),
            })
            .await;

        assert_eq!(response.markdown, "Unknown provider selected.");
    }

    #[tokio::test]
    async fn test_missing_key_query_needs_no_network() {
        let dir = TempDir::new().unwrap();
        let services = services_in(&dir).await;

        let response = services
            .ask_assistant(&AiRequest {
                query: "hello".to_string(),
                context_snippet: String::new(),
                provider: "openai".to_string(),
            })
            .await;

        assert!(response.markdown.contains("Configuration Error"));
        assert!(response.markdown.contains("openai"));
    }
}
