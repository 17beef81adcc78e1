use anyhow::{anyhow, Result};
use std::path::Path;
use std::sync::Mutex;

use super::traits::{BackendType, PersistencePort};
use crate::models::Company;

/// Keeps the collection in process memory. Used for tests and throwaway
/// sessions.
#[derive(Default)]
pub struct MemoryBackend {
    companies: Mutex<Vec<Company>>,
    fail_saves: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with `companies` already stored
    pub fn with_companies(companies: Vec<Company>) -> Self {
        Self {
            companies: Mutex::new(companies),
            fail_saves: false,
        }
    }

    /// A backend whose every save fails, for exercising error paths
    pub fn failing() -> Self {
        Self {
            companies: Mutex::new(Vec::new()),
            fail_saves: true,
        }
    }
}

impl PersistencePort for MemoryBackend {
    fn backend_type(&self) -> BackendType {
        BackendType::Memory
    }

    fn path(&self) -> Option<&Path> {
        None
    }

    fn load(&self) -> Result<Vec<Company>> {
        let guard = self
            .companies
            .lock()
            .map_err(|_| anyhow!("memory backend lock poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&self, companies: &[Company]) -> Result<()> {
        if self.fail_saves {
            anyhow::bail!("memory backend is read-only");
        }
        let mut guard = self
            .companies
            .lock()
            .map_err(|_| anyhow!("memory backend lock poisoned"))?;
        *guard = companies.to_vec();
        Ok(())
    }

    fn exists(&self) -> bool {
        self.companies.lock().map(|c| !c.is_empty()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_backend_round_trip() {
        let backend = MemoryBackend::new();
        assert!(!backend.exists());
        backend.save(&[Company::new(1, "Acme")]).unwrap();
        assert!(backend.exists());
        assert_eq!(backend.load().unwrap()[0].name, "Acme");
    }

    #[test]
    fn test_failing_backend_rejects_saves() {
        let backend = MemoryBackend::failing();
        assert!(backend.save(&[]).is_err());
        assert!(backend.load().unwrap().is_empty());
    }
}
