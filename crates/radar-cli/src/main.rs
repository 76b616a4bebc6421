use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use radar_core::{RadarConfig, RadarConfigBuilder};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod input;
mod render;
mod shutdown;
mod terminal;

use cli::{Args, Command};

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_file.as_deref())?;

    let (config, source) = load_config(args.config.as_deref())?;
    let config = apply_overrides(config, args.process.as_deref(), args.table_offset)?;

    let result = match args.command.clone().unwrap_or(Command::Run) {
        Command::Run => commands::run::run(&config, args.pid),
        Command::Dump { json } => commands::dump::run(&config, args.pid, json),
        Command::Config => commands::config::run(&config, source.as_deref()),
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("tew_radar=info".parse()?)
        .add_directive("radar_core=info".parse()?);

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

/// Load the config file, falling back to defaults when it does not exist.
///
/// Returns the path the config was actually read from, if any.
fn load_config(explicit: Option<&Path>) -> Result<(RadarConfig, Option<PathBuf>)> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match dirs::config_dir() {
            Some(dir) => RadarConfig::default_path_in(&dir),
            None => {
                warn!("Could not determine config directory, using defaults");
                return Ok((RadarConfig::default(), None));
            }
        },
    };

    match RadarConfig::load(&path) {
        Ok(config) => {
            info!("Loaded config from {}", path.display());
            Ok((config, Some(path)))
        }
        Err(e) if e.is_not_found() => {
            if explicit.is_some() {
                warn!("Config file {} not found, using defaults", path.display());
            } else {
                info!("No config at {}, using defaults", path.display());
            }
            Ok((RadarConfig::default(), None))
        }
        Err(e) => Err(e).with_context(|| format!("Failed to load config from {}", path.display())),
    }
}

/// Apply command-line overrides on top of the loaded config
fn apply_overrides(
    config: RadarConfig,
    process: Option<&str>,
    table_offset: Option<u64>,
) -> Result<RadarConfig> {
    let mut table = config.table.clone();
    let mut builder = RadarConfigBuilder::from_config(config);

    if let Some(name) = process {
        builder = builder.process_name(name);
    }
    if let Some(offset) = table_offset {
        table.base_offset = offset;
        builder = builder.table(table);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_config_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[radar]\ndefault_range = 2000").unwrap();

        let (config, source) = load_config(Some(file.path())).unwrap();
        assert_eq!(config.radar.default_range, 2000);
        assert_eq!(source.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_missing_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (config, source) = load_config(Some(dir.path().join("nope.toml").as_path())).unwrap();
        assert_eq!(config, RadarConfig::default());
        assert_eq!(source, None);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[radar]\nfps = 0").unwrap();
        assert!(load_config(Some(file.path())).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let config = apply_overrides(RadarConfig::default(), Some("Other.exe"), Some(0x1234)).unwrap();
        assert_eq!(config.process_name, "Other.exe");
        assert_eq!(config.table.base_offset, 0x1234);
        assert_eq!(config.table.stride, RadarConfig::default().table.stride);

        let unchanged = apply_overrides(RadarConfig::default(), None, None).unwrap();
        assert_eq!(unchanged, RadarConfig::default());
    }

    #[test]
    fn test_empty_process_override_is_rejected() {
        assert!(apply_overrides(RadarConfig::default(), Some(" "), None).is_err());
    }
}
