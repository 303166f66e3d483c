//! Persistence Store: load and save passes over the circuit data directory.
//!
//! Loading walks the legacy combined file first, then every per-world file,
//! activating records one by one. A failing record is logged, backed up once
//! per file and skipped; a failing file never stops its siblings.
//!
//! Saving is coalesced: [`CircuitStore::request_save`] writes at most once
//! per `save_reset_ticks` window. The window is closed by a task handed to
//! the host scheduler.

use super::activator;
use super::backup::BackupManager;
use super::config::PersistenceConfig;
use super::record::CircuitRecord;
use super::report::{
    FileLoadReport, FileSkip, FileWriteFailure, LoadReport, RecordFailure, SaveOutcome, SaveReport,
};
use super::scheduler::HostScheduler;
use super::serializer;
use crate::circuit::CircuitRegistry;
use crate::core::CircuitError;
use crate::storage::files;
use crate::world::WorldResolver;
use chrono::Utc;
use log::{error, info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{Level, event, info_span};

pub struct CircuitStore {
    config: PersistenceConfig,
    backups: BackupManager,
    scheduler: Arc<dyn HostScheduler>,
    /// Set while a write already happened in the current coalescing window.
    save_pending: Arc<AtomicBool>,
    /// Worlds whose file this run loaded or wrote. A world that ends up
    /// with no circuits still gets its file rewritten (as an empty list).
    known_worlds: BTreeSet<String>,
}

impl CircuitStore {
    pub fn new(config: PersistenceConfig, scheduler: Arc<dyn HostScheduler>) -> Self {
        let backups = BackupManager::new(config.backup_suffix.clone());
        Self {
            config,
            backups,
            scheduler,
            save_pending: Arc::new(AtomicBool::new(false)),
            known_worlds: BTreeSet::new(),
        }
    }

    pub fn config(&self) -> &PersistenceConfig {
        &self.config
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    // ========================================================================
    // Load path
    // ========================================================================

    /// Loads every circuit file in the data directory into `registry`.
    pub fn load_all(
        &mut self,
        registry: &mut CircuitRegistry,
        worlds: &dyn WorldResolver,
    ) -> LoadReport {
        let span = info_span!("circuits.load", data_dir = %self.config.data_dir.display());
        let _enter = span.enter();

        let mut report = LoadReport::default();
        let data_files = match files::discover(&self.config) {
            Ok(data_files) => data_files,
            Err(err) => {
                error!("Could not list circuit files: {}", err);
                return report;
            }
        };

        let mut migrated = false;
        if let Some(legacy) = data_files.legacy {
            let mut file_report = self.load_file(&legacy, None, registry, worlds);
            if file_report.skipped.is_none() {
                file_report.migrated_to = self.retire_legacy_file(&legacy);
                migrated = file_report.migrated_to.is_some();
            }
            report.files.push(file_report);
        }

        for (world, path) in data_files.worlds {
            report
                .files
                .push(self.load_file(&path, Some(&world), registry, worlds));
        }

        info!("Done. Loaded {} circuits.", registry.len());
        event!(
            Level::INFO,
            loaded = report.loaded_count(),
            failed = report.failure_count(),
            "circuit load pass finished"
        );

        if migrated {
            info!("Writing migrated circuits to per-world files...");
            report.migration_save = Some(self.save_all(registry, worlds));
        }

        report
    }

    /// Loads one file. With `expected_world` set, the whole file is skipped
    /// when that world is not loaded.
    pub fn load_file(
        &mut self,
        path: &Path,
        expected_world: Option<&str>,
        registry: &mut CircuitRegistry,
        worlds: &dyn WorldResolver,
    ) -> FileLoadReport {
        let mut report = FileLoadReport::new(path.to_path_buf(), expected_world.is_none());

        if let Some(world) = expected_world {
            if !worlds.is_loaded(world) {
                warn!(
                    "World {} seems to be nonexistent while circuits for it do exist.",
                    world
                );
                report.skipped = Some(FileSkip::WorldNotLoaded(world.to_string()));
                return report;
            }
        }

        info!("Reading circuits file {} ...", file_label(path));
        let values = match files::read_records(path) {
            Ok(values) => values,
            Err(err) => {
                error!("Circuits file '{}' threw error {}.", path.display(), err);
                if err.warrants_backup() {
                    report.backup = self.backups.ensure_backup(path);
                }
                report.skipped = Some(FileSkip::Unreadable(err));
                return report;
            }
        };

        // Only a file that parsed may later be rewritten without circuits.
        if let Some(world) = expected_world {
            self.known_worlds.insert(world.to_string());
        }

        info!("Activating circuits...");
        for (index, value) in values.into_iter().enumerate() {
            let class_name = value
                .get("class")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string);

            let activated = serializer::from_value(value)
                .and_then(|draft| activator::activate(draft, registry, worlds));

            match activated {
                Ok(id) => report.loaded.push(id),
                Err(err) => {
                    warn!(
                        "{} (record {} of {}). Ignoring circuit.",
                        err,
                        index,
                        file_label(path)
                    );
                    if err.warrants_backup() {
                        if let Some(backup) = self.backups.ensure_backup(path) {
                            report.backup = Some(backup);
                        }
                    }
                    report.failures.push(RecordFailure {
                        index,
                        class_name,
                        error: err,
                    });
                }
            }
        }

        report
    }

    /// Moves the legacy file aside without touching an earlier retired copy.
    fn retire_legacy_file(&self, legacy: &Path) -> Option<PathBuf> {
        let target = self.config.vacant_retired_legacy_path();
        if target.exists() {
            error!(
                "No free name to retire legacy circuits file {}.",
                legacy.display()
            );
            return None;
        }

        match fs::rename(legacy, &target) {
            Ok(()) => {
                info!(
                    "Migrated {} to per-world files; original kept as {}.",
                    file_label(legacy),
                    target.display()
                );
                Some(target)
            }
            Err(err) => {
                error!(
                    "Could not rename legacy circuits file {}: {}",
                    legacy.display(),
                    err
                );
                None
            }
        }
    }

    // ========================================================================
    // Save path
    // ========================================================================

    /// Saves unless a save already ran in the current coalescing window.
    pub fn request_save(
        &mut self,
        registry: &mut CircuitRegistry,
        worlds: &dyn WorldResolver,
    ) -> SaveOutcome {
        if self.save_pending.swap(true, Ordering::SeqCst) {
            return SaveOutcome::Coalesced;
        }

        let flag = Arc::clone(&self.save_pending);
        self.scheduler.run_after(
            self.config.save_reset_ticks,
            Box::new(move || flag.store(false, Ordering::SeqCst)),
        );

        SaveOutcome::Written(self.save_all(registry, worlds))
    }

    pub fn is_save_pending(&self) -> bool {
        self.save_pending.load(Ordering::SeqCst)
    }

    /// Unconditional write pass: one file per world. A circuit whose save
    /// hook panics leaves its world's previous file untouched.
    pub fn save_all(
        &mut self,
        registry: &mut CircuitRegistry,
        worlds: &dyn WorldResolver,
    ) -> SaveReport {
        let span = info_span!("circuits.save", data_dir = %self.config.data_dir.display());
        let _enter = span.enter();

        let integrity = registry.check_integrity(worlds);
        let removed = integrity.orphaned.len() + integrity.unknown_class.len();

        info!("Saving {} circuits state to file...", registry.len());

        let mut partitions: BTreeMap<String, Vec<CircuitRecord>> = BTreeMap::new();
        for world in &self.known_worlds {
            if worlds.is_loaded(world) {
                partitions.entry(world.clone()).or_default();
            }
        }

        let mut circuits = 0;
        let mut failed_worlds: BTreeMap<String, u32> = BTreeMap::new();
        for circuit in registry.all_live_entities_mut() {
            let world = circuit.world().name().to_string();
            let saved = catch_unwind(AssertUnwindSafe(|| {
                circuit.behavior_mut().save();
                serializer::to_record(circuit)
            }));
            match saved {
                Ok(record) => {
                    partitions.entry(world).or_default().push(record);
                    circuits += 1;
                }
                Err(_) => {
                    let id = circuit.id().unwrap_or_default();
                    error!(
                        "Circuit {} panicked while saving; keeping the previous file of world {}.",
                        circuit, world
                    );
                    failed_worlds.entry(world).or_insert(id);
                }
            }
        }

        let mut failures = Vec::new();
        for (world, id) in failed_worlds {
            if let Some(records) = partitions.remove(&world) {
                circuits -= records.len();
            }
            failures.push(FileWriteFailure {
                world,
                error: CircuitError::HookPanicked(id),
            });
        }

        let mut report = SaveReport {
            saved_at: Utc::now(),
            circuits,
            written: Vec::new(),
            failures,
            removed_by_integrity_check: removed,
        };

        for (world, records) in partitions {
            let path = self.config.world_file_path(&world);
            match files::write_records(&path, &records, self.config.pretty) {
                Ok(()) => {
                    self.known_worlds.insert(world);
                    report.written.push(path);
                }
                Err(err) => {
                    error!("Failed to save circuits of world {}: {}", world, err);
                    report.failures.push(FileWriteFailure { world, error: err });
                }
            }
        }

        event!(
            Level::INFO,
            circuits = report.circuits,
            files = report.written.len(),
            failed = report.failures.len(),
            "circuit save pass finished"
        );
        report
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl std::fmt::Debug for CircuitStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitStore")
            .field("config", &self.config)
            .field("save_pending", &self.is_save_pending())
            .field("known_worlds", &self.known_worlds)
            .finish_non_exhaustive()
    }
}
