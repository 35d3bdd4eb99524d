//! Storage configuration and path management for dexwatch.
//!
//! All path decisions live here so tests can inject a temp root and the
//! data directory can move without hunting through code. Production code
//! resolves `~/.dexwatch` (or `DEXWATCH_DATA_DIR`); tests use
//! [`StorageConfig::with_root`].

use std::env;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

pub const DATA_DIR_ENV: &str = "DEXWATCH_DATA_DIR";
const SOCKET_NAME: &str = "host.sock";
const SNAPSHOT_NAME: &str = "state.json";

#[derive(Debug, Clone)]
pub struct StorageConfig {
    root: PathBuf,
}

impl StorageConfig {
    /// Resolves the data root from `DEXWATCH_DATA_DIR`, falling back to
    /// `~/.dexwatch`.
    pub fn resolve() -> Result<Self> {
        if let Ok(path) = env::var(DATA_DIR_ENV) {
            return Ok(Self {
                root: PathBuf::from(path),
            });
        }
        let home = dirs::home_dir().ok_or(CoreError::HomeDirNotFound)?;
        Ok(Self {
            root: home.join(".dexwatch"),
        })
    }

    /// Creates a StorageConfig with a custom root directory, for tests.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the host socket. Exclusively bound by the host process.
    pub fn socket_file(&self) -> PathBuf {
        self.root.join(SOCKET_NAME)
    }

    /// Path to the persisted snapshot. Exclusively owned by the host process;
    /// window processes never read or write it.
    pub fn snapshot_file(&self) -> PathBuf {
        self.root.join(SNAPSHOT_NAME)
    }

    /// Directory of per-profile files, one JSON file per profile.
    pub fn profiles_dir(&self) -> PathBuf {
        self.root.join("profiles")
    }

    /// Directory for window-process log files (stdout belongs to the chrome
    /// command stream, so windows log to files).
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Ensures the root directory and standard subdirectories exist.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [self.root.clone(), self.profiles_dir(), self.logs_dir()] {
            fs_err::create_dir_all(&dir).map_err(|err| CoreError::io(&dir, err))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn with_root_sets_custom_path() {
        let config = StorageConfig::with_root(PathBuf::from("/tmp/test-dexwatch"));
        assert_eq!(config.root(), Path::new("/tmp/test-dexwatch"));
    }

    #[test]
    fn file_paths_hang_off_root() {
        let config = StorageConfig::with_root(PathBuf::from("/tmp/dexwatch"));
        assert_eq!(config.socket_file(), PathBuf::from("/tmp/dexwatch/host.sock"));
        assert_eq!(
            config.snapshot_file(),
            PathBuf::from("/tmp/dexwatch/state.json")
        );
        assert_eq!(config.profiles_dir(), PathBuf::from("/tmp/dexwatch/profiles"));
        assert_eq!(config.logs_dir(), PathBuf::from("/tmp/dexwatch/logs"));
    }

    #[test]
    fn ensure_dirs_creates_structure() {
        let temp = TempDir::new().unwrap();
        let config = StorageConfig::with_root(temp.path().join("data"));

        config.ensure_dirs().unwrap();

        assert!(config.root().exists());
        assert!(config.profiles_dir().exists());
        assert!(config.logs_dir().exists());
    }
}
