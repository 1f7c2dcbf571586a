//! Runtime configuration (RON file)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Settings the host shim needs: where the two stores live and how often the
/// counter sync runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Directory holding one snapshot file per mine.
    pub mines_dir: PathBuf,
    /// Path of the ledger database file.
    pub ledger_path: PathBuf,
    /// Seconds between counter-sync ticks.
    pub sync_interval_seconds: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            mines_dir: PathBuf::from("mines"),
            ledger_path: PathBuf::from("mines.db"),
            sync_interval_seconds: 10,
        }
    }
}

impl RuntimeConfig {
    /// Loads the config from `path`, falling back to defaults when the file
    /// is missing or unparsable. Configuration problems are never fatal.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            log::info!("no config at {:?}, using defaults", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match ron::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("failed to parse config {:?}: {}, using defaults", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("failed to read config {:?}: {}, using defaults", path, e);
                Self::default()
            }
        }
    }
}
