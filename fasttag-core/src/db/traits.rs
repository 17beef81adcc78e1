//! Persistence port
//!
//! The dashboard hands its whole company collection to a backend after
//! every successful mutation, and asks it for the collection once at start.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::models::Company;

/// Types of persistence backends available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendType {
    /// In-process only, nothing survives the session
    Memory,
    /// Single JSON file
    Json,
    /// SQLite key/value table
    Sqlite,
}

impl FromStr for BackendType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Ok(BackendType::Memory),
            "json" => Ok(BackendType::Json),
            "sqlite" | "db" => Ok(BackendType::Sqlite),
            _ => anyhow::bail!("Unknown backend '{}'. Use json or sqlite", s),
        }
    }
}

impl BackendType {
    /// Infers the backend from a data file extension, defaulting to JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("db") | Some("sqlite") | Some("sqlite3") => BackendType::Sqlite,
            _ => BackendType::Json,
        }
    }
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendType::Memory => write!(f, "memory"),
            BackendType::Json => write!(f, "JSON"),
            BackendType::Sqlite => write!(f, "SQLite"),
        }
    }
}

/// Core trait for persistence backends
pub trait PersistencePort: Send + Sync {
    /// Returns the backend type
    fn backend_type(&self) -> BackendType;

    /// Returns the path to the backing file, if there is one
    fn path(&self) -> Option<&Path>;

    /// Loads the entire company collection
    fn load(&self) -> Result<Vec<Company>>;

    /// Replaces the stored collection with `companies`
    fn save(&self, companies: &[Company]) -> Result<()>;

    /// Returns true if the backing store already holds data
    fn exists(&self) -> bool {
        self.path().is_some_and(|p| p.exists())
    }

    /// Returns statistics about the stored data
    fn stats(&self) -> Result<DatabaseStats> {
        let companies = self.load()?;
        Ok(DatabaseStats {
            company_count: companies.len(),
            item_count: companies.iter().map(|c| c.items.len()).sum(),
            failed_count: companies.iter().map(|c| c.failed_count()).sum(),
            backend_type: self.backend_type(),
        })
    }
}

/// Statistics about a stored collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseStats {
    pub company_count: usize,
    pub item_count: usize,
    pub failed_count: usize,
    pub backend_type: BackendType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend_type() {
        assert_eq!("SQLite".parse::<BackendType>().unwrap(), BackendType::Sqlite);
        assert_eq!(" json ".parse::<BackendType>().unwrap(), BackendType::Json);
        assert!("yaml".parse::<BackendType>().is_err());
    }

    #[test]
    fn test_backend_type_from_path() {
        assert_eq!(BackendType::from_path(Path::new("tags.sqlite3")), BackendType::Sqlite);
        assert_eq!(BackendType::from_path(Path::new("tags.json")), BackendType::Json);
    }
}
