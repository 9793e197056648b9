// wallpanel — turn a spare screen into a presence-aware wall display

//! Session configuration: the typed record plus its JSON store.
//!
//! Settings are loaded once at session start and applied again only on an
//! explicit reload. Anything missing (the file, a field, parsable content)
//! silently falls back to the documented defaults: configuration problems
//! never take the service down.

use crate::proximity::ProximityMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Motion score a processed frame must exceed before it counts as activity.
pub const DEFAULT_MOTION_THRESHOLD: f64 = 15.0;
/// Quiet period before the display goes to sleep.
pub const DEFAULT_SCREEN_OFF_DELAY_MS: u64 = 30_000;
/// Minimum interval between accepted proximity samples.
pub const DEFAULT_DETECTION_DELAY_MS: u64 = 500;
/// TCP port for the MJPEG viewer stream.
pub const DEFAULT_STREAM_PORT: u16 = 2971;

/// Per-session configuration record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub motion_detection_enabled: bool,
    pub proximity_enabled: bool,
    pub proximity_mode: ProximityMode,
    pub motion_threshold: f64,
    pub detection_delay_ms: u64,
    pub screen_off_delay_ms: u64,
    pub stream_enabled: bool,
    pub stream_port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            motion_detection_enabled: true,
            proximity_enabled: true,
            proximity_mode: ProximityMode::WaveWake,
            motion_threshold: DEFAULT_MOTION_THRESHOLD,
            detection_delay_ms: DEFAULT_DETECTION_DELAY_MS,
            screen_off_delay_ms: DEFAULT_SCREEN_OFF_DELAY_MS,
            stream_enabled: false,
            stream_port: DEFAULT_STREAM_PORT,
        }
    }
}

impl Settings {
    pub fn detection_delay(&self) -> Duration {
        Duration::from_millis(self.detection_delay_ms)
    }

    pub fn screen_off_delay(&self) -> Duration {
        Duration::from_millis(self.screen_off_delay_ms)
    }
}

/// JSON-file-backed settings store.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read settings, falling back to defaults for anything missing.
    pub fn load(&self) -> Settings {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(
                    "no settings file at {} ({}), using defaults",
                    self.path.display(),
                    e
                );
                return Settings::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(
                    "unparsable settings file {} ({}), using defaults",
                    self.path.display(),
                    e
                );
                Settings::default()
            }
        }
    }

    /// Persist the full settings record.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, raw)
            .with_context(|| format!("failed to write settings to {}", self.path.display()))
    }
}
