//! Settings persistence.
//!
//! One explicit store object, passed to the components that need it: load
//! once at startup, save on every change. There is no ambient global
//! settings state anywhere in the workspace.

use crate::paths::SkiffPaths;
use skiff_core::config::Settings;
use skiff_core::error::Result;
use std::fs::{self, File};
use std::io::Write as IoWrite;
use std::path::PathBuf;

/// File-backed settings store.
///
/// Saves go through a temp file, `sync_all`, and an atomic rename so a
/// crash mid-write never corrupts the previous settings.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store at the default location (`~/.config/skiff/settings.toml`).
    pub fn new() -> Result<Self> {
        Ok(Self {
            path: SkiffPaths::default().settings_file()?,
        })
    }

    /// Store at an explicit path (tests).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Loads settings. A missing or empty file yields defaults; a present
    /// but malformed file is an error rather than a silent reset.
    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            tracing::info!(
                "[SettingsStore] no settings file at {}, using defaults",
                self.path.display()
            );
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Settings::default());
        }

        let settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Persists settings atomically.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let rendered = toml::to_string_pretty(settings)?;

        let tmp_path = self.temp_path();
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(rendered.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;
        tracing::debug!("[SettingsStore] saved {}", self.path.display());
        Ok(())
    }

    /// Load-modify-save in one call; the usual save-on-change hook.
    pub fn update<F>(&self, apply: F) -> Result<Settings>
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.load()?;
        apply(&mut settings);
        self.save(&settings)?;
        Ok(settings)
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| format!(".{}.tmp", name.to_string_lossy()))
            .unwrap_or_else(|| ".settings.toml.tmp".to_string());
        match self.path.parent() {
            Some(parent) => parent.join(file_name),
            None => PathBuf::from(file_name),
        }
    }
}
