// SPDX-License-Identifier: MPL-2.0

use crate::config::APP_ID;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Persistent feed view preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    pub hide_replies: bool,
    pub hide_reposts: bool,
    pub hide_quote_posts: bool,
    /// Languages custom feeds are narrowed to, most preferred first
    pub content_languages: Vec<String>,
}

impl FeedSettings {
    /// Get the settings file path (~/.config/io.github.sethcottle.FeedTuner/feed-settings.json)
    pub fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push(APP_ID);
            p.push("feed-settings.json");
            p
        })
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from an explicit path. Missing or unreadable files yield defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(contents) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "ignoring malformed feed settings");
            Self::default()
        })
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::settings_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = FeedSettings::load_from(&dir.path().join("nope.json"));
        assert_eq!(settings, FeedSettings::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("feed-settings.json");
        let settings = FeedSettings {
            hide_replies: true,
            hide_quote_posts: true,
            content_languages: vec!["en".into(), "de".into()],
            ..Default::default()
        };

        settings.save_to(&path).unwrap();
        assert_eq!(FeedSettings::load_from(&path), settings);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed-settings.json");
        std::fs::write(&path, r#"{ "hide_reposts": true }"#).unwrap();

        let settings = FeedSettings::load_from(&path);
        assert!(settings.hide_reposts);
        assert!(!settings.hide_replies);
        assert!(settings.content_languages.is_empty());
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed-settings.json");
        std::fs::write(&path, "not json").unwrap();
        assert_eq!(FeedSettings::load_from(&path), FeedSettings::default());
    }
}
