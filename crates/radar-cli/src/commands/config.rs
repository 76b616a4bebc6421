//! Config command implementation.

use std::path::Path;

use anyhow::Result;
use radar_core::RadarConfig;

/// Print the effective configuration as TOML
pub fn run(config: &RadarConfig, source: Option<&Path>) -> Result<()> {
    match source {
        Some(path) => println!("# loaded from {}", path.display()),
        None => println!("# built-in defaults"),
    }
    print!("{}", config.to_toml_string()?);
    Ok(())
}
