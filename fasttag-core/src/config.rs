use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::db::BackendType;
use crate::export::DEFAULT_LINES_PER_PAGE;
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::ids::{TagFormat, DEFAULT_IDENTIFIER_START};
use crate::store::StoreOptions;

/// Overrides the settings file location
pub const CONFIG_ENV: &str = "FASTTAG_CONFIG";

/// Overrides the data file location from the settings file
pub const DATA_ENV: &str = "FASTTAG_DATA";

const DATA_FILE_NAME: &str = "fasttag.json";

/// User settings, read from a YAML file. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Data file; the backend is inferred from its extension unless set below
    pub data_path: Option<PathBuf>,
    pub backend: Option<BackendType>,
    pub tag_format: TagFormat,
    pub history_capacity: usize,
    pub identifier_start: u64,
    pub lines_per_page: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_path: None,
            backend: None,
            tag_format: TagFormat::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            identifier_start: DEFAULT_IDENTIFIER_START,
            lines_per_page: DEFAULT_LINES_PER_PAGE,
        }
    }
}

impl Settings {
    /// Loads settings from the provided path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings file: {:?}", path.as_ref()))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {:?}", path.as_ref()))
    }

    /// Loads settings, falling back to defaults when the file does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if !path.as_ref().exists() {
            log::debug!("No settings file at {:?}, using defaults", path.as_ref());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(&self)?;

        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write settings to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Writes a default settings file if none exists. Returns true when a
    /// file was created.
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<bool> {
        if path.as_ref().exists() {
            return Ok(false);
        }
        let settings = Settings {
            data_path: Some(default_data_path()?),
            ..Default::default()
        };
        settings.save(&path)?;
        log::info!("Created settings file {:?}", path.as_ref());
        Ok(true)
    }

    /// Data file location: `FASTTAG_DATA`, then `data_path`, then the
    /// platform data directory
    pub fn resolve_data_path(&self) -> Result<PathBuf> {
        self.data_path_from(std::env::var(DATA_ENV).ok())
    }

    fn data_path_from(&self, env_value: Option<String>) -> Result<PathBuf> {
        if let Some(path) = env_value.filter(|p| !p.trim().is_empty()) {
            return Ok(PathBuf::from(path));
        }
        match &self.data_path {
            Some(path) => Ok(path.clone()),
            None => default_data_path(),
        }
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            tag_format: self.tag_format,
            history_capacity: self.history_capacity,
            identifier_start: self.identifier_start,
        }
    }
}

/// Gets the path to the settings file
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }

    let home_dir = dirs::home_dir().context("Failed to determine home directory")?;

    Ok(home_dir.join(".fasttag.yaml"))
}

fn default_data_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .or_else(dirs::home_dir)
        .context("Failed to determine data directory")?;
    Ok(data_dir.join("fasttag").join(DATA_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load_or_default(temp_dir.path().join("none.yaml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.history_capacity, 50);
        assert_eq!(settings.identifier_start, 1000);
        assert_eq!(settings.tag_format, TagFormat::FullDate);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fasttag.yaml");
        fs::write(&path, "tag_format: year\nbackend: sqlite\n").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.tag_format, TagFormat::Year);
        assert_eq!(settings.backend, Some(BackendType::Sqlite));
        assert_eq!(settings.lines_per_page, DEFAULT_LINES_PER_PAGE);
        assert_eq!(settings.store_options().tag_format, TagFormat::Year);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fasttag.yaml");
        fs::write(&path, "history_capacity: lots\n").unwrap();
        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn test_create_default_only_once() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/fasttag.yaml");

        assert!(Settings::create_default(&path).unwrap());
        assert!(!Settings::create_default(&path).unwrap());

        let settings = Settings::load(&path).unwrap();
        assert!(settings.data_path.is_some());
    }

    #[test]
    fn test_data_path_precedence() {
        let settings = Settings {
            data_path: Some(PathBuf::from("/srv/tags.db")),
            ..Default::default()
        };
        assert_eq!(
            settings
                .data_path_from(Some("/tmp/override.json".to_string()))
                .unwrap(),
            PathBuf::from("/tmp/override.json")
        );
        assert_eq!(
            settings.data_path_from(None).unwrap(),
            PathBuf::from("/srv/tags.db")
        );
        assert!(Settings::default()
            .data_path_from(Some("  ".to_string()))
            .unwrap()
            .ends_with("fasttag/fasttag.json"));
    }
}
