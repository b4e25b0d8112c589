use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::surface::SurfaceConfig;
use crate::timeline::DEFAULT_MERGE_GAP_SECS;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSettings {
    /// Tick-loop interval while Running.
    pub tick_interval_ms: u64,
    /// Channel pull interval; sub-second so companion signals are observed
    /// promptly.
    pub poll_interval_ms: u64,
    /// Gap threshold for merging sessions into display blocks.
    pub merge_gap_secs: i64,
    /// Shared-store key the primary and companion contexts meet on.
    pub channel_key: String,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 250,
            poll_interval_ms: 500,
            merge_gap_secs: DEFAULT_MERGE_GAP_SECS,
            channel_key: "timer-state".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserSettings {
    timer: TimerSettings,
    surface: SurfaceConfig,
}

/// JSON-persisted settings with write-through updates. A malformed file
/// falls back to defaults rather than failing startup.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn timer(&self) -> TimerSettings {
        self.data.read().unwrap().timer.clone()
    }

    pub fn surface(&self) -> SurfaceConfig {
        self.data.read().unwrap().surface.clone()
    }

    pub fn update_timer(&self, settings: TimerSettings) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        guard.timer = settings;
        self.persist(&guard)
    }

    pub fn update_surface(&self, config: SurfaceConfig) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        guard.surface = config;
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: UserSettings = serde_json::from_str(&contents)?;
        let mut guard = self.data.write().unwrap();
        *guard = data;
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
