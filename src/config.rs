//! Settings persistence.
//!
//! The client keeps exactly one durable setting: the assistant API URL that
//! is forwarded with every chat request. It lives in
//! ${MNEMO_HOME}/settings.toml and falls back to a hard-coded default when
//! missing, blank, or unreadable.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default settings template with comments, embedded at compile time.
const DEFAULT_SETTINGS_TEMPLATE: &str = include_str!("default_settings.toml");

/// Base URL of the model backend, used whenever no setting is stored.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:1234/v1";

/// Origin of the assistant service the client POSTs to.
///
/// Overridable per invocation (`--server` / `MNEMO_SERVER`); not persisted.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";

pub mod paths {
    //! Path resolution for the mnemo home directory.
    //!
    //! MNEMO_HOME resolution order:
    //! 1. MNEMO_HOME environment variable (if set)
    //! 2. ~/.config/mnemo (default)

    use std::path::PathBuf;

    /// Returns the mnemo home directory.
    pub fn mnemo_home() -> PathBuf {
        if let Ok(home) = std::env::var("MNEMO_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("mnemo"))
            .expect("Could not determine home directory")
    }

    /// Returns the path to the settings.toml file.
    pub fn settings_path() -> PathBuf {
        mnemo_home().join("settings.toml")
    }

    /// Returns the directory log files are written to.
    pub fn logs_dir() -> PathBuf {
        mnemo_home().join("logs")
    }
}

/// Persisted client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Model backend base URL, sent as the `api_url` field of every chat
    /// request.
    pub api_url: String,
}

impl Settings {
    /// Loads settings from the default settings path.
    pub fn load() -> Self {
        Self::load_from(&paths::settings_path())
    }

    /// Loads settings from a specific path.
    ///
    /// Never fails and never returns an empty URL: a missing, unparsable,
    /// or blank value silently falls back to [`DEFAULT_API_URL`]. Stored
    /// values are trimmed on the way out.
    pub fn load_from(path: &Path) -> Self {
        let parsed: Option<Settings> = fs::read_to_string(path)
            .ok()
            .and_then(|contents| toml::from_str(&contents).ok());

        match parsed {
            Some(settings) if !settings.api_url.trim().is_empty() => Settings {
                api_url: settings.api_url.trim().to_string(),
            },
            _ => Settings::default(),
        }
    }

    /// Saves the API URL to the default settings path.
    ///
    /// Returns the value actually persisted.
    pub fn save_api_url(raw: &str) -> Result<String> {
        Self::save_api_url_to(&paths::settings_path(), raw)
    }

    /// Saves the API URL to a specific settings file path.
    ///
    /// The input is trimmed; a blank value persists the default URL rather
    /// than an empty string, so a later load always has something to return.
    /// Creates the file from the commented template if it doesn't exist and
    /// preserves existing comments via toml_edit. Returns the value actually
    /// persisted.
    pub fn save_api_url_to(path: &Path, raw: &str) -> Result<String> {
        use toml_edit::{DocumentMut, value};

        let trimmed = raw.trim();
        let persisted = if trimmed.is_empty() {
            DEFAULT_API_URL
        } else {
            trimmed
        };

        let contents = if path.exists() {
            fs::read_to_string(path)
                .with_context(|| format!("read settings from {}", path.display()))?
        } else {
            DEFAULT_SETTINGS_TEMPLATE.to_string()
        };

        let mut doc: DocumentMut = contents
            .parse()
            .with_context(|| format!("parse settings from {}", path.display()))?;
        doc["api_url"] = value(persisted);

        Self::write_settings(path, &doc.to_string())?;
        Ok(persisted.to_string())
    }

    /// Writes settings content to a file, creating parent directories as
    /// needed. Uses atomic write (temp file + rename) to prevent corruption.
    fn write_settings(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("write settings to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!("rename {} to {}", tmp_path.display(), path.display())
        })?;

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_missing_file_returns_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nonexistent.toml");

        let settings = Settings::load_from(&path);
        assert_eq!(settings.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_load_returns_stored_value() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "api_url = \"http://x/v1\"\n").unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.api_url, "http://x/v1");
    }

    #[test]
    fn test_load_blank_value_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "api_url = \"   \"\n").unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_load_trims_padding() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "api_url = \"  http://y:9/v1  \"\n").unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.api_url, "http://y:9/v1");
    }

    #[test]
    fn test_load_corrupt_file_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "api_url = [not, toml, at all\n").unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_save_round_trips_exact_value() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let persisted = Settings::save_api_url_to(&path, "http://x/v1").unwrap();
        assert_eq!(persisted, "http://x/v1");

        let settings = Settings::load_from(&path);
        assert_eq!(settings.api_url, "http://x/v1");
    }

    #[test]
    fn test_save_blank_persists_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let persisted = Settings::save_api_url_to(&path, "   ").unwrap();
        assert_eq!(persisted, DEFAULT_API_URL);

        // The file itself carries the default, not an empty string.
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains(DEFAULT_API_URL));
        assert_eq!(Settings::load_from(&path).api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_save_trims_before_persisting() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let persisted = Settings::save_api_url_to(&path, "  http://x/v1  ").unwrap();
        assert_eq!(persisted, "http://x/v1");
        assert_eq!(Settings::load_from(&path).api_url, "http://x/v1");
    }

    #[test]
    fn test_save_creates_file_from_template() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        Settings::save_api_url_to(&path, "http://x/v1").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("# mnemo settings"));
        assert!(contents.contains("http://x/v1"));
    }

    #[test]
    fn test_save_preserves_comments() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(
            &path,
            "# hand-written note\napi_url = \"http://old/v1\"\n",
        )
        .unwrap();

        Settings::save_api_url_to(&path, "http://new/v1").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("# hand-written note"));
        assert!(contents.contains("http://new/v1"));
        assert!(!contents.contains("http://old/v1"));
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("dir").join("settings.toml");

        Settings::save_api_url_to(&path, "http://x/v1").unwrap();

        assert!(path.exists());
        assert_eq!(Settings::load_from(&path).api_url, "http://x/v1");
    }

    #[test]
    fn test_save_then_load_observes_new_value_immediately() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        Settings::save_api_url_to(&path, "http://first/v1").unwrap();
        assert_eq!(Settings::load_from(&path).api_url, "http://first/v1");

        Settings::save_api_url_to(&path, "http://second/v1").unwrap();
        assert_eq!(Settings::load_from(&path).api_url, "http://second/v1");
    }
}
