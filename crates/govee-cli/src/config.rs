//! Configuration file management.
//!
//! A small optional TOML file supplies defaults the flags do not:
//!
//! - Linux: `~/.config/govee/config.toml`
//! - macOS: `~/Library/Application Support/govee/config.toml`
//! - Windows: `C:\Users\<user>\AppData\Roaming\govee\config.toml`
//!
//! A missing or unreadable file just means defaults.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default name filter applied when neither flag nor config provide one.
pub const DEFAULT_NAME_FILTER: &str = "H5075";

/// Default minimum days between successful sync runs.
pub const DEFAULT_SYNC_DAYS: i64 = 4;

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Database path override.
    #[serde(default)]
    pub database: Option<PathBuf>,

    /// Default device name filter for scans and discovery.
    #[serde(default)]
    pub name_contains: Option<String>,

    /// Default minimum days between successful sync runs.
    #[serde(default)]
    pub sync_days: Option<i64>,
}

impl Config {
    /// Path of the config file.
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("govee")
            .join("config.toml")
    }

    /// Load the config file, falling back to defaults when absent or
    /// malformed.
    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    fn load_from(path: &std::path::Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    debug!("Ignoring malformed config at {}: {e}", path.display());
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Resolve the name filter: flag, then config, then default.
    pub fn resolve_name_filter(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.name_contains.clone())
            .unwrap_or_else(|| DEFAULT_NAME_FILTER.to_string())
    }

    /// Resolve the sync interval in days: flag, then config, then default.
    /// Always at least one day.
    pub fn resolve_sync_days(&self, flag: Option<i64>) -> i64 {
        flag.or(self.sync_days).unwrap_or(DEFAULT_SYNC_DAYS).max(1)
    }

    /// Resolve the database path: flag, then config, then platform default.
    pub fn resolve_database(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.database.clone())
            .unwrap_or_else(govee_store::default_db_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_is_default() {
        let config = Config::load_from(std::path::Path::new("/nonexistent/config.toml"));
        assert!(config.database.is_none());
        assert_eq!(config.resolve_name_filter(None), "H5075");
        assert_eq!(config.resolve_sync_days(None), 4);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "name_contains = \"Govee\"\nsync_days = 7").unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.resolve_name_filter(None), "Govee");
        assert_eq!(config.resolve_sync_days(None), 7);
        // A flag still wins over the file
        assert_eq!(config.resolve_name_filter(Some("".to_string())), "");
        assert_eq!(config.resolve_sync_days(Some(2)), 2);
    }

    #[test]
    fn test_malformed_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "not [valid toml").unwrap();

        let config = Config::load_from(&path);
        assert!(config.name_contains.is_none());
    }

    #[test]
    fn test_sync_days_floor() {
        let config = Config::default();
        assert_eq!(config.resolve_sync_days(Some(0)), 1);
        assert_eq!(config.resolve_sync_days(Some(-3)), 1);
    }

    #[test]
    fn test_database_resolution_order() {
        let config = Config {
            database: Some(PathBuf::from("/from/config.db")),
            ..Default::default()
        };

        assert_eq!(
            config.resolve_database(Some(PathBuf::from("/from/flag.db"))),
            PathBuf::from("/from/flag.db")
        );
        assert_eq!(
            config.resolve_database(None),
            PathBuf::from("/from/config.db")
        );
    }
}
