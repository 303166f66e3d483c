//! Data-directory layout and whole-file I/O for circuit records.

use crate::core::{CircuitError, Result};
use crate::persist::config::PersistenceConfig;
use crate::persist::record::CircuitRecord;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

// ============================================================================
// Discovery
// ============================================================================

/// Circuit files found in the data directory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DataFiles {
    /// The combined legacy file, when present.
    pub legacy: Option<PathBuf>,
    /// Per-world files as `(world name, path)`, sorted by world name.
    pub worlds: Vec<(String, PathBuf)>,
}

/// Lists circuit files. A missing data directory yields no files.
pub fn discover(config: &PersistenceConfig) -> Result<DataFiles> {
    let mut files = DataFiles::default();
    if !config.data_dir.exists() {
        return Ok(files);
    }

    let legacy = config.legacy_path();
    if legacy.is_file() {
        files.legacy = Some(legacy);
    }

    let entries =
        fs::read_dir(&config.data_dir).map_err(|e| CircuitError::file_io(&config.data_dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| CircuitError::file_io(&config.data_dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if let Some(world) = config.world_name_of(file_name) {
            files.worlds.push((world, path));
        }
    }

    files.worlds.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

// ============================================================================
// Reading
// ============================================================================

/// Reads a file as a sequence of untyped records.
///
/// Each element is decoded separately by the caller so one bad record does
/// not spoil the others. An empty file or a JSON `null` holds no records.
pub fn read_records(path: &Path) -> Result<Vec<serde_json::Value>> {
    let raw = fs::read_to_string(path).map_err(|e| CircuitError::file_io(path, e))?;
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let parsed: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| CircuitError::corrupt_file(path, format!("not valid JSON: {}", e)))?;

    match parsed {
        serde_json::Value::Null => Ok(Vec::new()),
        serde_json::Value::Array(records) => Ok(records),
        other => Err(CircuitError::corrupt_file(
            path,
            format!("expected a list of circuit records, found {}", json_kind(&other)),
        )),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a list",
        serde_json::Value::Object(_) => "an object",
    }
}

// ============================================================================
// Writing
// ============================================================================

/// Writes `records` to `path` through a sibling temp file that is flushed,
/// synced and then renamed over the target. A crash mid-write leaves the
/// previous file intact.
pub fn write_records(path: &Path, records: &[CircuitRecord], pretty: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| CircuitError::file_io(parent, e))?;
        }
    }

    let temp_path = temp_path_for(path);
    let temp_file = File::create(&temp_path).map_err(|e| CircuitError::file_io(&temp_path, e))?;
    let mut writer = BufWriter::new(temp_file);

    let encoded = if pretty {
        serde_json::to_writer_pretty(&mut writer, records)
    } else {
        serde_json::to_writer(&mut writer, records)
    };
    encoded.map_err(|e| CircuitError::file_io(&temp_path, e))?;

    writer.flush().map_err(|e| CircuitError::file_io(&temp_path, e))?;
    writer
        .get_mut()
        .sync_all()
        .map_err(|e| CircuitError::file_io(&temp_path, e))?;
    drop(writer);

    fs::rename(&temp_path, path).map_err(|e| CircuitError::file_io(path, e))?;
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BlockPos;
    use tempfile::TempDir;

    fn record(world: &str) -> CircuitRecord {
        CircuitRecord {
            class_name: "inverter".to_string(),
            world: world.to_string(),
            activation_block: BlockPos::new(0, 64, 0),
            chunk: None,
            inputs: vec![BlockPos::new(1, 64, 0)],
            outputs: vec![BlockPos::new(-1, 64, 0)],
            interfaces: Vec::new(),
            structure: Vec::new(),
            sign_args: Vec::new(),
            state: None,
            id: Some(0),
        }
    }

    #[test]
    fn discover_separates_legacy_and_world_files() {
        let dir = TempDir::new().unwrap();
        for name in [
            "redstonechips.circuits",
            "world.circuits",
            "aether.circuits",
            "world.circuits.BACKUP0",
            "world.circuits.tmp",
            "notes.txt",
        ] {
            fs::write(dir.path().join(name), b"[]").unwrap();
        }

        let files = discover(&PersistenceConfig::new(dir.path())).unwrap();
        assert_eq!(files.legacy, Some(dir.path().join("redstonechips.circuits")));
        let names: Vec<&str> = files.worlds.iter().map(|(w, _)| w.as_str()).collect();
        assert_eq!(names, vec!["aether", "world"]);
    }

    #[test]
    fn discover_tolerates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let files = discover(&PersistenceConfig::new(dir.path().join("absent"))).unwrap();
        assert_eq!(files, DataFiles::default());
    }

    #[test]
    fn write_then_read_keeps_records_and_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("world.circuits");

        write_records(&path, &[record("world"), record("world")], false).unwrap();
        assert!(!dir.path().join("nested").join("world.circuits.tmp").exists());

        let values = read_records(&path).unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0]["class"], "inverter");
    }

    #[test]
    fn read_rejects_non_list_documents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("world.circuits");

        fs::write(&path, b"{\"class\": \"x\"}").unwrap();
        assert!(matches!(read_records(&path), Err(CircuitError::CorruptFile { .. })));

        fs::write(&path, b"[{\"class\": ").unwrap();
        assert!(matches!(read_records(&path), Err(CircuitError::CorruptFile { .. })));

        let missing = dir.path().join("absent.circuits");
        assert!(matches!(read_records(&missing), Err(CircuitError::FileIo { .. })));

        fs::write(&path, b"null").unwrap();
        assert!(read_records(&path).unwrap().is_empty());

        fs::write(&path, b"").unwrap();
        assert!(read_records(&path).unwrap().is_empty());
    }
}
