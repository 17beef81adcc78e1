//! JSON file backend
//!
//! Stores the collection in a single JSON file through [`Storage`], which
//! takes care of file locking.

use anyhow::Result;
use std::path::Path;

use super::traits::{BackendType, PersistencePort};
use crate::models::Company;
use crate::storage::Storage;

pub struct JsonBackend {
    storage: Storage,
}

impl JsonBackend {
    /// Creates a new JSON backend for the given file path
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            storage: Storage::new(path),
        }
    }

    /// Gets a reference to the underlying Storage
    pub fn storage(&self) -> &Storage {
        &self.storage
    }
}

impl PersistencePort for JsonBackend {
    fn backend_type(&self) -> BackendType {
        BackendType::Json
    }

    fn path(&self) -> Option<&Path> {
        Some(self.storage.path())
    }

    fn load(&self) -> Result<Vec<Company>> {
        self.storage.load()
    }

    fn save(&self, companies: &[Company]) -> Result<()> {
        self.storage.save(companies)
    }
}
