//! Path management for Tandem
//!
//! ## Path Resolution Order
//!
//! 1. `TANDEM_DATA_DIR` environment variable (if set)
//! 2. The platform config directory for `tandem` (via `directories`)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::TandemError;

/// Manages all paths used by Tandem
#[derive(Debug, Clone)]
pub struct TandemPaths {
    base_dir: PathBuf,
}

impl TandemPaths {
    /// Resolve the base directory from the environment or the platform default
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, TandemError> {
        let base_dir = if let Ok(custom) = std::env::var("TANDEM_DATA_DIR") {
            PathBuf::from(custom)
        } else {
            ProjectDirs::from("", "", "tandem")
                .map(|dirs| dirs.config_dir().to_path_buf())
                .ok_or_else(|| {
                    TandemError::Config("Could not determine a home directory".into())
                })?
        };

        Ok(Self { base_dir })
    }

    /// Create paths rooted at a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory (`<base>/data/`)
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Sectors and categories
    pub fn hierarchy_file(&self) -> PathBuf {
        self.data_dir().join("hierarchy.json")
    }

    /// Category and sector budget rows for every period
    pub fn budgets_file(&self) -> PathBuf {
        self.data_dir().join("budgets.json")
    }

    pub fn transactions_file(&self) -> PathBuf {
        self.data_dir().join("transactions.json")
    }

    /// In-progress propagation markers
    pub fn propagation_file(&self) -> PathBuf {
        self.data_dir().join("propagation.json")
    }

    /// Ensure the base and data directories exist
    pub fn ensure_directories(&self) -> Result<(), TandemError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| TandemError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| TandemError::Io(format!("Failed to create data directory: {}", e)))?;

        Ok(())
    }

    /// Check if Tandem has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_custom_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TandemPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.base_dir(), temp_dir.path());
        assert_eq!(paths.data_dir(), temp_dir.path().join("data"));
    }

    #[test]
    fn test_ensure_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TandemPaths::with_base_dir(temp_dir.path().join("nested"));

        paths.ensure_directories().unwrap();

        assert!(paths.data_dir().exists());
        assert!(!paths.is_initialized());
    }

    #[test]
    fn test_file_paths() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TandemPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.settings_file(), temp_dir.path().join("config.json"));
        assert_eq!(
            paths.budgets_file(),
            temp_dir.path().join("data").join("budgets.json")
        );
        assert_eq!(
            paths.propagation_file(),
            temp_dir.path().join("data").join("propagation.json")
        );
    }
}
