//! Config-directory resolution.

use skiff_core::error::{Result, SkiffError};
use std::path::PathBuf;

const APP_DIR: &str = "skiff";
const SETTINGS_FILE: &str = "settings.toml";

/// Well-known file locations under the user's config directory.
///
/// A base override exists for tests; production callers pass `None`.
pub struct SkiffPaths {
    base: Option<PathBuf>,
}

impl SkiffPaths {
    pub fn new(base: Option<PathBuf>) -> Self {
        Self { base }
    }

    /// Returns `~/.config/skiff` (or the platform equivalent), creating
    /// nothing.
    pub fn config_dir(&self) -> Result<PathBuf> {
        if let Some(base) = &self.base {
            return Ok(base.clone());
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| SkiffError::config("could not determine config directory"))
    }

    /// Path of the settings file.
    pub fn settings_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join(SETTINGS_FILE))
    }
}

impl Default for SkiffPaths {
    fn default() -> Self {
        Self::new(None)
    }
}
