use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::db::normalize_legacy;
use crate::models::Company;

/// How long to wait for another process to release the data file
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Saves and loads the company collection as a JSON file, guarded by a
/// sibling lock file so concurrent processes do not interleave writes
pub struct Storage {
    file_path: PathBuf,
    lock_file_path: PathBuf,
}

impl Storage {
    /// Creates a new Storage instance
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        let file_path = file_path.as_ref().to_path_buf();
        let mut lock_name = file_path.clone().into_os_string();
        lock_name.push(".lock");
        Self {
            file_path,
            lock_file_path: PathBuf::from(lock_name),
        }
    }

    /// Returns the path to the storage file
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn exists(&self) -> bool {
        self.file_path.exists()
    }

    /// Acquire an exclusive lock on the file for writing.
    /// The returned handle must be held for the duration of the write.
    fn acquire_write_lock(&self) -> Result<File> {
        if let Some(parent) = self.lock_file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to create lock file: {:?}", self.lock_file_path))?;

        self.wait_for(|| FileExt::try_lock_exclusive(&lock_file))?;
        Ok(lock_file)
    }

    /// Acquire a shared lock for reading, if a lock file exists at all
    fn acquire_read_lock(&self) -> Result<Option<File>> {
        if !self.lock_file_path.exists() {
            return Ok(None);
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to open lock file: {:?}", self.lock_file_path))?;

        self.wait_for(|| FileExt::try_lock_shared(&lock_file))?;
        Ok(Some(lock_file))
    }

    fn wait_for<F>(&self, mut try_lock: F) -> Result<()>
    where
        F: FnMut() -> std::io::Result<()>,
    {
        let start = std::time::Instant::now();
        loop {
            match try_lock() {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if start.elapsed() > LOCK_TIMEOUT {
                        anyhow::bail!(
                            "Timeout waiting for file lock - another process may be writing: {:?}",
                            self.file_path
                        );
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to acquire lock on {:?}", self.lock_file_path)
                    })
                }
            }
        }
    }

    /// Loads the company collection. A missing file is an empty collection.
    pub fn load(&self) -> Result<Vec<Company>> {
        if !self.file_path.exists() {
            log::info!("No data file at {:?}, starting empty", self.file_path);
            return Ok(Vec::new());
        }

        let _lock = self.acquire_read_lock()?;

        let file = File::open(&self.file_path)
            .with_context(|| format!("Failed to open file: {:?}", self.file_path))?;
        let reader = BufReader::new(file);

        let raw: serde_json::Value = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse JSON from {:?}", self.file_path))?;

        normalize_legacy(raw)
            .with_context(|| format!("Unrecognised company data in {:?}", self.file_path))
    }

    /// Saves the company collection with an exclusive lock held
    pub fn save(&self, companies: &[Company]) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut lock_file = self.acquire_write_lock()?;

        let _ = writeln!(
            lock_file,
            "Locked by PID {} at {}",
            std::process::id(),
            chrono::Utc::now().to_rfc3339()
        );

        let json = serde_json::to_string_pretty(companies)?;
        fs::write(&self.file_path, json)
            .with_context(|| format!("Failed to write {:?}", self.file_path))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::new(temp_dir.path().join("missing.json"));
        assert!(!storage.exists());
        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_creates_parent_dirs_and_lock_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("data.json");
        let storage = Storage::new(&path);

        storage.save(&[Company::new(1, "Acme")]).unwrap();

        assert!(path.exists());
        assert!(temp_dir.path().join("nested").join("data.json.lock").exists());
        let loaded = storage.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Acme");
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Storage::new(&path).load().is_err());
    }
}
