//! Persisted directory settings
//!
//! The three directory fields are remembered between runs in a small JSON
//! record. The batch core never reads this file itself; frontends load it,
//! resolve a [`BatchJob`](crate::BatchJob) from it, and save edits back.

use crate::{
    batch::BatchJob,
    debounce::Debouncer,
    error::{MergeError, Result},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the settings file location
pub const SETTINGS_ENV_VAR: &str = "MASK_MERGER_SETTINGS";

/// Quiet period before an edited record is written
pub const AUTOSAVE_DELAY: Duration = Duration::from_millis(2000);

/// The remembered directory fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub image_dir: String,
    pub mask_dir: String,
    pub output_dir: String,
}

impl Settings {
    /// Build a job from the stored fields, failing if any field is empty
    pub fn to_job(&self) -> Result<BatchJob> {
        for (field, value) in [
            ("image directory", &self.image_dir),
            ("mask directory", &self.mask_dir),
            ("output directory", &self.output_dir),
        ] {
            if value.trim().is_empty() {
                return Err(MergeError::settings(format!("{} is not set", field)));
            }
        }
        Ok(BatchJob::new(&self.image_dir, &self.mask_dir, &self.output_dir))
    }
}

/// Reads and writes [`Settings`] at a fixed location
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store at the default location
    pub fn new() -> Result<Self> {
        Ok(Self::at(Self::default_path()?))
    }

    /// Store at an explicit location
    pub fn at<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// `$MASK_MERGER_SETTINGS`, else `<config dir>/mask-merger/settings.json`
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path_override) = std::env::var(SETTINGS_ENV_VAR) {
            return Ok(PathBuf::from(path_override));
        }

        Ok(dirs::config_dir()
            .ok_or_else(|| {
                MergeError::settings(format!(
                    "Failed to determine config directory. Set {} environment variable.",
                    SETTINGS_ENV_VAR
                ))
            })?
            .join("mask-merger")
            .join("settings.json"))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record; a missing file yields empty settings
    pub fn load(&self) -> Result<Settings> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No saved settings");
                return Ok(Settings::default());
            },
            Err(e) => return Err(MergeError::file_io_error("read settings", &self.path, &e)),
        };

        serde_json::from_str(&content).map_err(|e| {
            MergeError::settings(format!(
                "Malformed settings file '{}': {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Write the record, creating parent directories as needed
    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| MergeError::file_io_error("create settings directory", parent, &e))?;
        }

        let json = serde_json::to_string_pretty(settings)
            .map_err(|e| MergeError::settings(format!("Failed to serialize settings: {}", e)))?;
        std::fs::write(&self.path, json)
            .map_err(|e| MergeError::file_io_error("write settings", &self.path, &e))?;

        tracing::debug!(path = %self.path.display(), "Settings saved");
        Ok(())
    }

    /// Debounced saver writing the last submitted record after `delay`
    #[must_use]
    pub fn autosaver(&self, delay: Duration) -> Debouncer<Settings> {
        let store = self.clone();
        Debouncer::new(delay, move |settings: Settings| {
            if let Err(e) = store.save(&settings) {
                tracing::warn!("Failed to save settings: {}", e);
            }
        })
    }
}
