use crate::error::{InsightError, Result};
use crate::store::remote::UserId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.json";
const SESSION_FILENAME: &str = "session.json";
const LOCAL_DIR: &str = "local";
const CLOUD_DIR: &str = "cloud";

/// Which clock calendar views (days, months, hours) are computed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeZonePolicy {
    #[default]
    Local,
    Utc,
}

impl std::fmt::Display for TimeZonePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeZonePolicy::Local => write!(f, "local"),
            TimeZonePolicy::Utc => write!(f, "utc"),
        }
    }
}

/// Configuration for solo, stored in `<home>/config.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InsightConfig {
    /// Where device-local slots live (default `<home>/local`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Root of the cloud document store (default `<home>/cloud`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_dir: Option<PathBuf>,

    #[serde(default)]
    pub time_zone: TimeZonePolicy,
}

impl InsightConfig {
    pub const KEYS: [&'static str; 3] = ["data_dir", "cloud_dir", "time_zone"];

    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(home: P) -> Result<Self> {
        let path = home.as_ref().join(CONFIG_FILENAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content)
            .map_err(|e| InsightError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn save<P: AsRef<Path>>(&self, home: P) -> Result<()> {
        let home = home.as_ref();
        fs::create_dir_all(home)?;
        let content = serde_json::to_string_pretty(self)?;
        fs::write(home.join(CONFIG_FILENAME), content)?;
        Ok(())
    }

    pub fn local_dir(&self, home: &Path) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| home.join(LOCAL_DIR))
    }

    pub fn cloud_dir(&self, home: &Path) -> PathBuf {
        self.cloud_dir.clone().unwrap_or_else(|| home.join(CLOUD_DIR))
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "data_dir" => Some(display_path(&self.data_dir)),
            "cloud_dir" => Some(display_path(&self.cloud_dir)),
            "time_zone" => Some(self.time_zone.to_string()),
            _ => None,
        }
    }

    /// Set a key from its string form. An empty path resets it to the default.
    pub fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), String> {
        let value = value.trim();
        match key {
            "data_dir" => self.data_dir = optional_path(value),
            "cloud_dir" => self.cloud_dir = optional_path(value),
            "time_zone" => {
                self.time_zone = match value.to_ascii_lowercase().as_str() {
                    "local" => TimeZonePolicy::Local,
                    "utc" => TimeZonePolicy::Utc,
                    other => return Err(format!("Invalid time_zone '{}' (use local or utc)", other)),
                }
            }
            _ => return Err(format!("Unknown config key: {}", key)),
        }
        Ok(())
    }
}

/// The signed-in identity, kept in `<home>/session.json` between runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActiveSession {
    pub user: UserId,
}

impl ActiveSession {
    /// `Ok(None)` when nobody is signed in. An unreadable file counts as
    /// signed out.
    pub fn load<P: AsRef<Path>>(home: P) -> Result<Option<Self>> {
        let path = home.as_ref().join(SESSION_FILENAME);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        match serde_json::from_str(&content) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    pub fn save<P: AsRef<Path>>(&self, home: P) -> Result<()> {
        let home = home.as_ref();
        fs::create_dir_all(home)?;
        fs::write(home.join(SESSION_FILENAME), serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn clear<P: AsRef<Path>>(home: P) -> Result<()> {
        let path = home.as_ref().join(SESSION_FILENAME);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(default)".to_string())
}

fn optional_path(value: &str) -> Option<PathBuf> {
    (!value.is_empty()).then(|| PathBuf::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_config_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = InsightConfig::load(dir.path()).unwrap();
        assert_eq!(config, InsightConfig::default());
        assert_eq!(config.local_dir(dir.path()), dir.path().join("local"));
    }

    #[test]
    fn save_and_load() {
        let dir = TempDir::new().unwrap();
        let mut config = InsightConfig::default();
        config.set("time_zone", "UTC").unwrap();
        config.set("cloud_dir", "/tmp/shared-cloud").unwrap();
        config.save(dir.path()).unwrap();

        let loaded = InsightConfig::load(dir.path()).unwrap();
        assert_eq!(loaded.time_zone, TimeZonePolicy::Utc);
        assert_eq!(loaded.cloud_dir(dir.path()), PathBuf::from("/tmp/shared-cloud"));
    }

    #[test]
    fn set_rejects_unknown_keys_and_values() {
        let mut config = InsightConfig::default();
        assert!(config.set("colour", "red").is_err());
        assert!(config.set("time_zone", "mars").is_err());
        config.set("data_dir", "/x").unwrap();
        config.set("data_dir", "").unwrap();
        assert_eq!(config.get("data_dir").as_deref(), Some("(default)"));
    }

    #[test]
    fn session_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        assert_eq!(ActiveSession::load(dir.path()).unwrap(), None);

        let session = ActiveSession {
            user: UserId::new("amy"),
        };
        session.save(dir.path()).unwrap();
        assert_eq!(ActiveSession::load(dir.path()).unwrap(), Some(session));

        ActiveSession::clear(dir.path()).unwrap();
        ActiveSession::clear(dir.path()).unwrap();
        assert_eq!(ActiveSession::load(dir.path()).unwrap(), None);
    }

    #[test]
    fn broken_file_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "{").unwrap();
        assert!(matches!(
            InsightConfig::load(dir.path()),
            Err(InsightError::Config(_))
        ));
    }
}
