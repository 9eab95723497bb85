use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::{log_warn, render::RenderOptions, wheel::WheelConfig};

const ENABLE_LOGS: bool = true;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct WheelSettings {
    pub spin: WheelConfig,
    pub render: RenderOptions,
}

/// JSON-file backed settings. Missing or unreadable content falls back to
/// defaults; invalid spin values are refused on update.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<WheelSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            match serde_json::from_str::<WheelSettings>(&contents) {
                Ok(settings) => settings,
                Err(err) => {
                    log_warn!("ignoring unparsable settings at {}: {err}", path.display());
                    WheelSettings::default()
                }
            }
        } else {
            WheelSettings::default()
        };

        if let Err(err) = data.spin.validate() {
            log_warn!("settings at {} hold an invalid spin config: {err}", path.display());
        }

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn settings(&self) -> Result<WheelSettings> {
        let guard = self
            .data
            .read()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        Ok(guard.clone())
    }

    pub fn spin_config(&self) -> Result<WheelConfig> {
        Ok(self.settings()?.spin)
    }

    pub fn render_options(&self) -> Result<RenderOptions> {
        Ok(self.settings()?.render)
    }

    pub fn update_spin_config(&self, config: WheelConfig) -> Result<()> {
        config.validate()?;
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        guard.spin = config;
        self.persist(&guard)
    }

    pub fn update_render_options(&self, options: RenderOptions) -> Result<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        guard.render = options;
        self.persist(&guard)
    }

    fn persist(&self, data: &WheelSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data: WheelSettings = serde_json::from_str(&contents)?;
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        *guard = data;
        Ok(())
    }
}
