//! Persistence layer for the company collection
//!
//! This module provides a trait-based port for storage backends, so the
//! dashboard can persist to a JSON file, a SQLite database, or nowhere at
//! all while keeping the same interface.

mod json_backend;
mod memory_backend;
mod migration;
mod sqlite_backend;
mod traits;

pub use json_backend::JsonBackend;
pub use memory_backend::MemoryBackend;
pub use migration::{
    export_to_json, import_from_json, migrate_json_to_sqlite, migrate_sqlite_to_json,
    normalize_legacy,
};
pub use sqlite_backend::SqliteBackend;
pub use traits::{BackendType, DatabaseStats, PersistencePort};

use anyhow::Result;
use std::path::Path;

/// Creates a backend based on the file extension or an explicit type
pub fn create_backend(
    path: &Path,
    backend_type: Option<BackendType>,
) -> Result<Box<dyn PersistencePort>> {
    let bt = backend_type.unwrap_or_else(|| BackendType::from_path(path));

    log::debug!("Using {} backend at {:?}", bt, path);

    match bt {
        BackendType::Memory => Ok(Box::new(MemoryBackend::new())),
        BackendType::Json => Ok(Box::new(JsonBackend::new(path))),
        BackendType::Sqlite => Ok(Box::new(SqliteBackend::new(path)?)),
    }
}
