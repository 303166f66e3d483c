use super::backup::DEFAULT_BACKUP_SUFFIX;
use crate::core::{CircuitError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_EXTENSION: &str = ".circuits";
pub const DEFAULT_LEGACY_FILE_NAME: &str = "redstonechips.circuits";
pub const DEFAULT_LEGACY_SUFFIX: &str = ".old";

/// Circuit persistence configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Directory holding the circuit data files
    pub data_dir: PathBuf,

    /// Extension of per-world files, including the leading dot
    pub extension: String,

    /// Name of the combined pre-per-world file
    pub legacy_file_name: String,

    /// Appended to the legacy file name once it has been migrated
    pub legacy_suffix: String,

    /// Appended, followed by a counter, to backups of damaged files
    pub backup_suffix: String,

    /// Ticks before another save request may write again
    pub save_reset_ticks: u64,

    /// Pretty-print the JSON data files
    pub pretty: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self::new("circuits")
    }
}

impl PersistenceConfig {
    /// Create a configuration rooted at `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            extension: DEFAULT_EXTENSION.to_string(),
            legacy_file_name: DEFAULT_LEGACY_FILE_NAME.to_string(),
            legacy_suffix: DEFAULT_LEGACY_SUFFIX.to_string(),
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
            save_reset_ticks: 1,
            pretty: false,
        }
    }

    /// Load a configuration from a JSON file; absent keys keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| CircuitError::file_io(path, e))?;
        serde_json::from_str(&raw).map_err(|e| CircuitError::file_io(path, e))
    }

    /// Set the per-world file extension
    pub fn extension(mut self, extension: &str) -> Self {
        self.extension = extension.to_string();
        self
    }

    /// Set the legacy combined file name
    pub fn legacy_file_name(mut self, name: &str) -> Self {
        self.legacy_file_name = name.to_string();
        self
    }

    /// Set the suffix used when retiring the legacy file
    pub fn legacy_suffix(mut self, suffix: &str) -> Self {
        self.legacy_suffix = suffix.to_string();
        self
    }

    /// Set the backup suffix
    pub fn backup_suffix(mut self, suffix: &str) -> Self {
        self.backup_suffix = suffix.to_string();
        self
    }

    /// Set the coalescing window in ticks (at least one)
    pub fn save_reset_ticks(mut self, ticks: u64) -> Self {
        self.save_reset_ticks = ticks.max(1);
        self
    }

    /// Enable pretty-printed output
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn legacy_path(&self) -> PathBuf {
        self.data_dir.join(&self.legacy_file_name)
    }

    pub fn retired_legacy_path(&self) -> PathBuf {
        self.data_dir
            .join(format!("{}{}", self.legacy_file_name, self.legacy_suffix))
    }

    /// First of `<legacy><suffix>`, `<legacy><suffix>1`, `<legacy><suffix>2`, ...
    /// that does not exist yet. An earlier retired copy is never replaced.
    pub fn vacant_retired_legacy_path(&self) -> PathBuf {
        let base = self.retired_legacy_path();
        if !base.exists() {
            return base;
        }
        (1u32..)
            .map(|n| {
                let mut name = base.clone().into_os_string();
                name.push(n.to_string());
                PathBuf::from(name)
            })
            .find(|candidate| !candidate.exists())
            .unwrap_or(base)
    }

    pub fn world_file_path(&self, world: &str) -> PathBuf {
        self.data_dir.join(format!("{}{}", world, self.extension))
    }

    /// World name encoded in a per-world file name, or `None` when the name
    /// does not carry the extension or is the legacy file.
    pub fn world_name_of(&self, file_name: &str) -> Option<String> {
        if file_name == self.legacy_file_name {
            return None;
        }
        file_name
            .strip_suffix(self.extension.as_str())
            .filter(|world| !world.is_empty())
            .map(str::to_string)
    }
}
