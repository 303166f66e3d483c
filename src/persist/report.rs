use crate::core::CircuitError;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// A record that could not be activated.
#[derive(Debug)]
pub struct RecordFailure {
    /// Position of the record inside its file.
    pub index: usize,
    /// Class name when the record got far enough to expose one.
    pub class_name: Option<String>,
    pub error: CircuitError,
}

/// Why a whole file was not loaded.
#[derive(Debug)]
pub enum FileSkip {
    /// The world named by the file is not loaded. Not treated as corruption.
    WorldNotLoaded(String),
    /// The file could not be read or parsed as a whole.
    Unreadable(CircuitError),
}

/// Outcome of loading one data file.
#[derive(Debug)]
pub struct FileLoadReport {
    pub path: PathBuf,
    /// True for the combined legacy file.
    pub legacy: bool,
    /// Ids of the circuits activated from this file.
    pub loaded: Vec<u32>,
    pub failures: Vec<RecordFailure>,
    /// Backup written during this load, if any.
    pub backup: Option<PathBuf>,
    pub skipped: Option<FileSkip>,
    /// Where the legacy file was moved after loading.
    pub migrated_to: Option<PathBuf>,
}

impl FileLoadReport {
    pub(crate) fn new(path: PathBuf, legacy: bool) -> Self {
        Self {
            path,
            legacy,
            loaded: Vec::new(),
            failures: Vec::new(),
            backup: None,
            skipped: None,
            migrated_to: None,
        }
    }
}

/// Outcome of a full load pass over the data directory.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub files: Vec<FileLoadReport>,
    /// Set when the legacy migration triggered an immediate save.
    pub migration_save: Option<SaveReport>,
}

impl LoadReport {
    pub fn loaded_count(&self) -> usize {
        self.files.iter().map(|file| file.loaded.len()).sum()
    }

    pub fn failure_count(&self) -> usize {
        self.files.iter().map(|file| file.failures.len()).sum()
    }

    pub fn backups(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.iter().filter_map(|file| file.backup.as_ref())
    }

    pub fn file(&self, path: &std::path::Path) -> Option<&FileLoadReport> {
        self.files.iter().find(|file| file.path == path)
    }
}

/// A per-world file that could not be written.
#[derive(Debug)]
pub struct FileWriteFailure {
    pub world: String,
    pub error: CircuitError,
}

/// Outcome of one physical write pass.
#[derive(Debug)]
pub struct SaveReport {
    pub saved_at: DateTime<Utc>,
    /// Number of circuits serialized.
    pub circuits: usize,
    /// Files written successfully.
    pub written: Vec<PathBuf>,
    pub failures: Vec<FileWriteFailure>,
    /// Circuits dropped by the registry integrity check before saving.
    pub removed_by_integrity_check: usize,
}

#[derive(Debug)]
pub enum SaveOutcome {
    /// A write already happened within the current coalescing window.
    Coalesced,
    Written(SaveReport),
}

impl SaveOutcome {
    pub fn is_coalesced(&self) -> bool {
        matches!(self, Self::Coalesced)
    }

    pub fn report(&self) -> Option<&SaveReport> {
        match self {
            Self::Coalesced => None,
            Self::Written(report) => Some(report),
        }
    }
}
