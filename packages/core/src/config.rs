//! Configuration for navigation persistence
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::PathBuf;

/// Environment variable that overrides the default database location
pub const DATABASE_PATH_ENV: &str = "MYNOTES_DB_PATH";

/// Upper bound for the SQLite busy timeout (one minute)
const MAX_BUSY_TIMEOUT_MS: u64 = 60_000;

/// Configuration for the navigation database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Explicit database file; takes precedence over the environment
    pub database_path: Option<PathBuf>,

    /// How long a connection waits on a locked database before failing
    pub busy_timeout_ms: u64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            busy_timeout_ms: crate::db::DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl NavigationConfig {
    /// Resolve where the database lives
    ///
    /// In order: `database_path`, the `MYNOTES_DB_PATH` environment
    /// variable, then `~/.mynotes/database/data.db`.
    pub fn resolve_database_path(&self) -> Result<PathBuf, std::io::Error> {
        self.resolve_with(std::env::var_os(DATABASE_PATH_ENV), dirs::home_dir())
    }

    fn resolve_with(
        &self,
        env_path: Option<OsString>,
        home_dir: Option<PathBuf>,
    ) -> Result<PathBuf, std::io::Error> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }

        if let Some(path) = env_path.filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }

        let home_dir = home_dir.ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Cannot determine home directory",
            )
        })?;

        Ok(home_dir.join(".mynotes").join("database").join("data.db"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if let Some(path) = &self.database_path {
            if path.as_os_str().is_empty() {
                return Err("database_path cannot be empty".to_string());
            }
            if path.is_dir() {
                return Err(format!("database_path {:?} is a directory", path));
            }
        }

        if self.busy_timeout_ms == 0 {
            return Err("busy_timeout_ms must be greater than 0".to_string());
        }

        if self.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
            return Err(format!(
                "busy_timeout_ms cannot exceed {}",
                MAX_BUSY_TIMEOUT_MS
            ));
        }

        Ok(())
    }
}
