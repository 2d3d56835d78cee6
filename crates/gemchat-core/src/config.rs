use crate::backend::http::DEFAULT_BACKEND_URL;
use crate::controller::ControllerSettings;
use crate::theme::Theme;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides the configured backend
pub const BACKEND_URL_ENV: &str = "GEMCHAT_BACKEND_URL";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub backend_url: Option<String>,
    pub theme: Option<Theme>,
    pub typing_delay_ms: Option<u64>,
    pub context_window: Option<usize>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    /// Persist the theme preference, keeping every other setting
    pub fn save_theme(theme: Theme) -> Result<()> {
        let mut config = Self::load().unwrap_or_else(|_| Self::new());
        config.theme = Some(theme);
        config.save()
    }

    pub fn theme(&self) -> Theme {
        self.theme.unwrap_or_default()
    }

    /// Resolve the backend URL: explicit override, then environment, then
    /// this file, then the built-in default.
    pub fn backend_url(&self, cli_override: Option<&str>) -> String {
        cli_override
            .map(str::to_string)
            .or_else(|| std::env::var(BACKEND_URL_ENV).ok().filter(|v| !v.is_empty()))
            .or_else(|| self.backend_url.clone())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        let defaults = ControllerSettings::default();
        ControllerSettings {
            context_window: self.context_window.unwrap_or(defaults.context_window),
            reveal_delay: self
                .typing_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.reveal_delay),
        }
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("gemchat").join("config.json"))
    }
}
