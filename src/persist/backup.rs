//! Backup Manager: one byte-for-byte copy of a damaged data file per run.

use log::{error, info};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BACKUP_SUFFIX: &str = ".BACKUP";

#[derive(Debug, Clone)]
pub struct BackupManager {
    suffix: String,
    backed_up: HashSet<PathBuf>,
}

impl Default for BackupManager {
    fn default() -> Self {
        Self::new(DEFAULT_BACKUP_SUFFIX)
    }
}

impl BackupManager {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            backed_up: HashSet::new(),
        }
    }

    /// Copies `source` to `<name><suffix><n>` next to it, `n` being the lowest
    /// index without an existing file.
    ///
    /// Only the first call for a given file does anything; later calls in the
    /// same run return `None`. A failed copy is logged and still counts as
    /// the attempt for this run.
    pub fn ensure_backup(&mut self, source: &Path) -> Option<PathBuf> {
        if !self.backed_up.insert(source.to_path_buf()) {
            return None;
        }

        let backup = self.next_backup_path(source);
        info!(
            "An error occurred while loading circuits from {}. A backup copy is being written to {} so no circuit data is lost.",
            source.display(),
            backup.display()
        );

        match fs::copy(source, &backup) {
            Ok(_) => Some(backup),
            Err(err) => {
                error!(
                    "Error while trying to write backup file {}: {}",
                    backup.display(),
                    err
                );
                None
            }
        }
    }

    pub fn has_backed_up(&self, source: &Path) -> bool {
        self.backed_up.contains(source)
    }

    fn next_backup_path(&self, source: &Path) -> PathBuf {
        let file_name = source
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();

        (0u32..)
            .map(|idx| {
                let mut name = file_name.clone();
                name.push(format!("{}{}", self.suffix, idx));
                source.with_file_name(name)
            })
            .find(|candidate| !candidate.exists())
            .unwrap_or_else(|| source.with_extension("backup"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn copies_once_per_file_per_run() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("overworld.circuits");
        fs::write(&source, b"[broken").unwrap();

        let mut backups = BackupManager::default();
        let first = backups.ensure_backup(&source).unwrap();
        assert_eq!(first, dir.path().join("overworld.circuits.BACKUP0"));
        assert_eq!(fs::read(&first).unwrap(), b"[broken");

        assert!(backups.ensure_backup(&source).is_none());
        assert!(backups.has_backed_up(&source));
        assert!(!dir.path().join("overworld.circuits.BACKUP1").exists());
    }

    #[test]
    fn new_run_never_overwrites_previous_backup() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("nether.circuits");
        fs::write(&source, b"v1").unwrap();
        BackupManager::default().ensure_backup(&source).unwrap();

        fs::write(&source, b"v2").unwrap();
        let second = BackupManager::default().ensure_backup(&source).unwrap();

        assert_eq!(second, dir.path().join("nether.circuits.BACKUP1"));
        assert_eq!(fs::read(dir.path().join("nether.circuits.BACKUP0")).unwrap(), b"v1");
        assert_eq!(fs::read(&second).unwrap(), b"v2");
    }

    #[test]
    fn copy_failure_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone.circuits");

        let mut backups = BackupManager::new(".bak");
        assert!(backups.ensure_backup(&missing).is_none());
        assert!(backups.has_backed_up(&missing));
    }
}
