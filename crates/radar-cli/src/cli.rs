use std::path::PathBuf;

use clap::{Parser, Subcommand};
use radar_core::memory::layout::parse_hex_address;

#[derive(Parser, Debug)]
#[command(name = "tew-radar")]
#[command(version)]
#[command(about = "Entity radar for The Evil Within")]
pub struct Args {
    /// Config file (defaults to <config dir>/tew-radar/config.toml)
    #[arg(short, long, global = true, env = "TEW_RADAR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Executable name of the game process
    #[arg(short, long, global = true)]
    pub process: Option<String>,

    /// Attach to this PID instead of searching by name
    #[arg(long, global = true)]
    pub pid: Option<u32>,

    /// Module-relative offset of the entity table pointer (hex)
    #[arg(long, global = true, value_parser = parse_offset)]
    pub table_offset: Option<u64>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Live radar in the terminal (default)
    Run,
    /// Print a single snapshot and exit
    Dump {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as TOML
    Config,
}

fn parse_offset(s: &str) -> Result<u64, String> {
    parse_hex_address(s).map_err(|e| e.to_string())
}
