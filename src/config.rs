use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{Result, StudyError};

/// Name of the sound file looked for next to the executable
pub const DEFAULT_ALARM_FILE: &str = "default_alarm.wav";

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the session, journal and subjects files
    pub data_dir: PathBuf,

    /// Sound played when a break ends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_sound: Option<PathBuf>,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            alarm_sound: None,
        }
    }

    /// Location of the config file in the platform config directory
    pub fn default_path() -> Result<PathBuf> {
        ProjectDirs::from("", "", "studylog")
            .map(|dirs| dirs.config_dir().join("config.json"))
            .ok_or_else(|| StudyError::ConfigError {
                message: "Could not determine the configuration directory".to_string(),
            })
    }

    /// Folder offered when the user has not picked one yet
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Reads the config file.
    ///
    /// Returns `None` when the file is absent or its data directory no
    /// longer exists, meaning the user has to choose a folder again.
    pub fn load(path: &Path) -> Result<Option<Config>> {
        if !path.exists() {
            debug!("No config file at {}", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content).map_err(|e| StudyError::ConfigError {
            message: format!("{}: {}", path.display(), e),
        })?;

        if !config.data_dir.is_dir() {
            warn!(
                "Configured data directory {} is not a directory",
                config.data_dir.display()
            );
            return Ok(None);
        }

        Ok(Some(config))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|_| StudyError::DirectoryError {
                    path: parent.to_path_buf(),
                })?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Saves the config, logging rather than returning any failure
    pub fn persist(&self, path: &Path) {
        if let Err(e) = self.save(path) {
            warn!("Could not save configuration: {}", e);
        }
    }

    /// Updates one setting from a `key=value` pair
    pub fn set(&mut self, assignment: &str) -> Result<()> {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| StudyError::ConfigError {
                message: format!("Expected key=value, got \"{}\"", assignment),
            })?;
        let value = value.trim();

        match key.trim() {
            "data_dir" => {
                if value.is_empty() {
                    return Err(StudyError::MissingField {
                        field: "data_dir".to_string(),
                    });
                }
                let dir = PathBuf::from(value);
                if !dir.is_dir() {
                    return Err(StudyError::DirectoryError { path: dir });
                }
                self.data_dir = dir;
            }
            "alarm_sound" => {
                self.alarm_sound = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            other => {
                return Err(StudyError::ConfigError {
                    message: format!("Unknown setting \"{}\" (use data_dir or alarm_sound)", other),
                })
            }
        }
        Ok(())
    }

    /// Sound to play when a break ends, if any usable file is available
    pub fn alarm_path(&self) -> Option<PathBuf> {
        if let Some(path) = self.alarm_sound.as_ref().filter(|p| p.exists()) {
            return Some(path.clone());
        }

        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_ALARM_FILE)))
            .filter(|p| p.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_means_no_config() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load(&dir.path().join("config.json")).unwrap().is_none());
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = Config::new(dir.path().to_path_buf());
        config.alarm_sound = Some(PathBuf::from("/sounds/bell.wav"));
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), Some(config));
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{\"data_dir\": 42}").unwrap();
        assert!(matches!(Config::load(&path), Err(StudyError::ConfigError { .. })));
    }

    #[test]
    fn persist_swallows_write_failures() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "a regular file").unwrap();
        let path = blocker.join("config.json");

        let config = Config::new(dir.path().to_path_buf());
        assert!(config.save(&path).is_err());
        config.persist(&path);
        assert!(!path.exists());
    }

    #[test]
    fn vanished_data_dir_requires_new_choice() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        Config::new(dir.path().join("gone")).save(&path).unwrap();
        assert!(Config::load(&path).unwrap().is_none());
    }

    #[test]
    fn set_validates_keys() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::new(dir.path().to_path_buf());
        config.set("alarm_sound=/a/b.wav").unwrap();
        assert_eq!(config.alarm_sound, Some(PathBuf::from("/a/b.wav")));
        config.set("alarm_sound=").unwrap();
        assert!(config.alarm_sound.is_none());
        assert!(config.set("theme=dark").is_err());
        assert!(config.set("data_dir=/definitely/not/here").is_err());
        assert!(config.set("nonsense").is_err());
    }

    #[test]
    fn missing_alarm_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::new(dir.path().to_path_buf());
        config.alarm_sound = Some(dir.path().join("nope.wav"));
        let resolved = config.alarm_path();
        assert_ne!(resolved, Some(dir.path().join("nope.wav")));
    }
}
