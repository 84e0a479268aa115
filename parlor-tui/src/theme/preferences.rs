use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::ThemeManager;

/// Last theme picked with the cycle key, remembered between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemePreferences {
    #[serde(default)]
    pub theme: Option<String>,
}

pub struct ThemeStore {
    path: PathBuf,
}

impl ThemeStore {
    pub fn new() -> Self {
        Self {
            path: dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("parlor")
                .join("theme.toml"),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<ThemePreferences> {
        if !self.path.exists() {
            return Ok(ThemePreferences::default());
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read theme preferences from {:?}", self.path))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse theme preferences from {:?}", self.path))
    }

    pub fn save(&self, theme: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }
        let preferences = ThemePreferences {
            theme: Some(theme.to_string()),
        };
        let contents =
            toml::to_string_pretty(&preferences).context("Failed to serialize theme preferences")?;
        fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write theme preferences to {:?}", self.path))
    }

    /// A saved choice wins over the configured default.
    pub fn theme_manager(&self, configured: &str) -> ThemeManager {
        let mut manager = ThemeManager::new();
        let saved = self.load().ok().and_then(|p| p.theme);
        let wanted = saved.as_deref().unwrap_or(configured);

        if !manager.set_theme(wanted) {
            warn!(
                "Theme '{}' not found, using '{}'",
                wanted,
                manager.current_theme().slug()
            );
        }
        manager
    }
}

impl Default for ThemeStore {
    fn default() -> Self {
        Self::new()
    }
}
