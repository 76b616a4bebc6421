//! CLI command implementations.

pub mod config;
pub mod dump;
pub mod run;

use anyhow::{Context, Result};
use radar_core::{ProcessHandle, RadarConfig};

/// Open the game process, by PID when given, otherwise by name
pub fn attach(config: &RadarConfig, pid: Option<u32>) -> Result<ProcessHandle> {
    let process = if let Some(pid) = pid {
        ProcessHandle::open(pid, &config.process_name)
    } else {
        ProcessHandle::find_and_open(&config.process_name)
    };
    process.with_context(|| format!("Failed to attach to {}", config.process_name))
}
