//! Radar configuration.
//!
//! Built once at startup and passed by reference to every component. The
//! TOML file may omit any section or key; omitted values keep their defaults.
//!
//! ```toml
//! process_name = "EvilWithin.exe"
//!
//! [table]
//! base_offset = "0x1E7AF20"
//! stride = "0x18"
//!
//! [radar]
//! default_range = 1500
//!
//! [layout.health]
//! kind = "float"
//! resolution = { type = "direct", offset = "0x8C4" }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::memory::layout::{EntityLayout, TableLayout};

/// Executable name of the target process
pub const DEFAULT_PROCESS_NAME: &str = "EvilWithin.exe";

/// Config file name inside the per-user config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Display and zoom settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarSettings {
    /// Radar range (world units from center to edge) at startup
    pub default_range: u32,
    pub min_range: u32,
    pub max_range: u32,
    /// Range change per zoom step
    pub range_step: u32,
    /// Ticks per second
    pub fps: u32,
    pub show_info_panel: bool,
    /// Number of evenly spaced rings inside the range circle
    pub range_rings: u32,
}

impl Default for RadarSettings {
    fn default() -> Self {
        Self {
            default_range: 1000,
            min_range: 100,
            max_range: 5000,
            range_step: 100,
            fps: 60,
            show_info_panel: false,
            range_rings: 8,
        }
    }
}

impl RadarSettings {
    pub fn validate(&self) -> Result<()> {
        if self.min_range == 0 || self.min_range > self.max_range {
            return Err(Error::Config(format!(
                "invalid range bounds: min {} max {}",
                self.min_range, self.max_range
            )));
        }
        if !(self.min_range..=self.max_range).contains(&self.default_range) {
            return Err(Error::Config(format!(
                "default_range {} outside [{}, {}]",
                self.default_range, self.min_range, self.max_range
            )));
        }
        if self.range_step == 0 {
            return Err(Error::Config("range_step must be non-zero".into()));
        }
        if self.fps == 0 {
            return Err(Error::Config("fps must be non-zero".into()));
        }
        Ok(())
    }
}

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarConfig {
    pub process_name: String,
    pub table: TableLayout,
    pub radar: RadarSettings,
    pub layout: EntityLayout,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            process_name: DEFAULT_PROCESS_NAME.to_string(),
            table: TableLayout::default(),
            radar: RadarSettings::default(),
            layout: EntityLayout::default(),
        }
    }
}

impl RadarConfig {
    /// Create a new configuration builder
    pub fn builder() -> RadarConfigBuilder {
        RadarConfigBuilder::default()
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RadarConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.process_name.trim().is_empty() {
            return Err(Error::Config("process_name must not be empty".into()));
        }
        self.table.validate()?;
        self.layout.validate()?;
        self.radar.validate()
    }

    /// `<config_dir>/tew-radar/config.toml` for a given config directory
    pub fn default_path_in(config_dir: &Path) -> PathBuf {
        config_dir.join("tew-radar").join(CONFIG_FILE_NAME)
    }
}

/// Builder for RadarConfig
#[derive(Debug, Clone, Default)]
pub struct RadarConfigBuilder {
    process_name: Option<String>,
    table: Option<TableLayout>,
    radar: Option<RadarSettings>,
    layout: Option<EntityLayout>,
}

impl RadarConfigBuilder {
    /// Start from an existing configuration instead of the defaults
    pub fn from_config(config: RadarConfig) -> Self {
        Self {
            process_name: Some(config.process_name),
            table: Some(config.table),
            radar: Some(config.radar),
            layout: Some(config.layout),
        }
    }

    pub fn process_name<S: Into<String>>(mut self, name: S) -> Self {
        self.process_name = Some(name.into());
        self
    }

    pub fn table(mut self, table: TableLayout) -> Self {
        self.table = Some(table);
        self
    }

    pub fn radar(mut self, radar: RadarSettings) -> Self {
        self.radar = Some(radar);
        self
    }

    pub fn layout(mut self, layout: EntityLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<RadarConfig> {
        let default = RadarConfig::default();
        let config = RadarConfig {
            process_name: self.process_name.unwrap_or(default.process_name),
            table: self.table.unwrap_or(default.table),
            radar: self.radar.unwrap_or(default.radar),
            layout: self.layout.unwrap_or(default.layout),
        };
        config.validate()?;
        Ok(config)
    }
}
