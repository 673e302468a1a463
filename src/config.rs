/// Application settings
///
/// Read from `settings.json` in the user's config directory:
/// - Linux: ~/.config/lolcat-builder/settings.json
/// - macOS: ~/Library/Application Support/lolcat-builder/settings.json
/// - Windows: %APPDATA%\lolcat-builder\settings.json
///
/// Every field is optional; anything missing falls back to the defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Directory name used under the platform config/data directories
pub const APP_DIR: &str = "lolcat-builder";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Volume that receives `lolcats/`; defaults to the pictures directory
    pub storage_root: Option<PathBuf>,
    /// SQLite catalog of saved pictures
    pub media_index_path: Option<PathBuf>,
    /// Where the editor session is kept between runs
    pub session_path: Option<PathBuf>,
    /// Reopen the last photo and captions on startup
    pub restore_session: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_root: None,
            media_index_path: None,
            session_path: None,
            restore_session: true,
        }
    }
}

impl Settings {
    /// Load settings from the default location, falling back to defaults
    /// if the file is missing or unreadable
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };

        match Self::load_from(&path) {
            Ok(settings) => {
                info!("⚙️  Settings loaded from {}", path.display());
                settings
            }
            Err(e) => {
                warn!("⚠️  Ignoring settings at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("settings.json"))
    }

    pub fn storage_root(&self) -> PathBuf {
        self.storage_root
            .clone()
            .or_else(dirs::picture_dir)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn media_index_path(&self) -> PathBuf {
        self.media_index_path
            .clone()
            .unwrap_or_else(|| data_dir().join("media_index.db"))
    }

    pub fn session_path(&self) -> PathBuf {
        self.session_path
            .clone()
            .unwrap_or_else(|| data_dir().join("session.json"))
    }
}

/// Get the per-user data directory for the application
/// - Linux: ~/.local/share/lolcat-builder
fn data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.restore_session);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "storage_root": "/media/sdcard" }"#).unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.storage_root(), PathBuf::from("/media/sdcard"));
        assert!(settings.restore_session);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "restore_session = false").unwrap();

        assert!(matches!(Settings::load_from(&path), Err(SettingsError::Json(_))));
    }

    #[test]
    fn test_overrides_win() {
        let settings = Settings {
            media_index_path: Some(PathBuf::from("/tmp/index.db")),
            session_path: Some(PathBuf::from("/tmp/session.json")),
            ..Settings::default()
        };
        assert_eq!(settings.media_index_path(), PathBuf::from("/tmp/index.db"));
        assert_eq!(settings.session_path(), PathBuf::from("/tmp/session.json"));
    }
}
