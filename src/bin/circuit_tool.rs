use anyhow::{Context, Result, anyhow, bail};
use circuitstore::persist::serializer;
use circuitstore::storage::files;
use circuitstore::{CircuitRecord, PersistenceConfig};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "circuit-tool")]
#[command(about = "Offline tooling for circuit data directories")]
struct Cli {
    /// Optional JSON persistence config; overrides the defaults for the directory layout
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List circuit files with record counts per class
    Inspect { dir: PathBuf },
    /// Decode every record and report the ones that would fail to load
    Validate { dir: PathBuf },
    /// Split the legacy combined file into per-world files
    SplitLegacy {
        dir: PathBuf,
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Inspect { dir } => inspect(&load_config(cli.config.as_deref(), dir)?),
        Command::Validate { dir } => validate(&load_config(cli.config.as_deref(), dir)?),
        Command::SplitLegacy { dir, pretty } => {
            let config = load_config(cli.config.as_deref(), dir)?;
            let pretty = pretty || config.pretty;
            split_legacy(&config, pretty)
        }
    }
}

fn load_config(path: Option<&Path>, dir: PathBuf) -> Result<PersistenceConfig> {
    let mut config = match path {
        Some(path) => PersistenceConfig::from_json_file(path)
            .with_context(|| format!("Failed to read config '{}'", path.display()))?,
        None => PersistenceConfig::default(),
    };
    config.data_dir = dir;
    Ok(config)
}

fn all_files(config: &PersistenceConfig) -> Result<Vec<PathBuf>> {
    let data_files = files::discover(config)
        .with_context(|| format!("Failed to list '{}'", config.data_dir.display()))?;
    Ok(data_files
        .legacy
        .into_iter()
        .chain(data_files.worlds.into_iter().map(|(_, path)| path))
        .collect())
}

fn inspect(config: &PersistenceConfig) -> Result<()> {
    let paths = all_files(config)?;
    if paths.is_empty() {
        println!("No circuit files in {}", config.data_dir.display());
        return Ok(());
    }

    for path in paths {
        let values = match files::read_records(&path) {
            Ok(values) => values,
            Err(err) => {
                println!("{}: unreadable ({})", path.display(), err);
                continue;
            }
        };

        let mut per_class: BTreeMap<String, usize> = BTreeMap::new();
        for value in &values {
            let class = value
                .get("class")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("<missing class>");
            *per_class.entry(class.to_string()).or_default() += 1;
        }

        println!("{}: {} circuits", path.display(), values.len());
        for (class, count) in per_class {
            println!("  {:<24} {}", class, count);
        }
    }
    Ok(())
}

fn validate(config: &PersistenceConfig) -> Result<()> {
    let mut bad = 0usize;

    for path in all_files(config)? {
        let values = match files::read_records(&path) {
            Ok(values) => values,
            Err(err) => {
                println!("- {}: {}", path.display(), err);
                bad += 1;
                continue;
            }
        };

        for (index, value) in values.into_iter().enumerate() {
            if let Err(err) = serializer::from_value(value) {
                println!("- {} record {}: {}", path.display(), index, err);
                bad += 1;
            }
        }
    }

    if bad == 0 {
        println!("Validation: OK");
        Ok(())
    } else {
        Err(anyhow!("Validation: FAILED ({} problems)", bad))
    }
}

fn split_legacy(config: &PersistenceConfig, pretty: bool) -> Result<()> {
    let legacy = config.legacy_path();
    if !legacy.is_file() {
        bail!("No legacy file at '{}'", legacy.display());
    }

    let values = files::read_records(&legacy)
        .with_context(|| format!("Failed to read '{}'", legacy.display()))?;

    let mut per_world: BTreeMap<String, Vec<CircuitRecord>> = BTreeMap::new();
    let mut skipped = 0usize;
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<CircuitRecord>(value) {
            Ok(record) => per_world.entry(record.world.clone()).or_default().push(record),
            Err(err) => {
                println!("Skipping record {}: {}", index, err);
                skipped += 1;
            }
        }
    }

    for world in per_world.keys() {
        let target = config.world_file_path(world);
        if target.exists() {
            bail!(
                "Refusing to overwrite existing '{}'; load it through the server instead",
                target.display()
            );
        }
    }

    for (world, records) in &per_world {
        let target = config.world_file_path(world);
        files::write_records(&target, records, pretty)
            .with_context(|| format!("Failed to write '{}'", target.display()))?;
        println!("{}: {} circuits -> {}", world, records.len(), target.display());
    }

    let retired = config.vacant_retired_legacy_path();
    if retired.exists() {
        bail!("No free name to retire '{}'", legacy.display());
    }
    fs::rename(&legacy, &retired).with_context(|| {
        format!("Failed to rename '{}' to '{}'", legacy.display(), retired.display())
    })?;
    println!(
        "Legacy file kept as {} ({} records skipped)",
        retired.display(),
        skipped
    );
    Ok(())
}
