//! Engine configuration.
//!
//! Thresholds the dive list depends on but which are policy rather than
//! physics: when dives are close enough to share a trip, what counts as
//! being at the surface, and how far back repetitive-dive history reaches.
//! Loaded from TOML; every field has a default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::stats::DEFAULT_SURFACE_DEPTH_MM;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub grouping: GroupingConfig,

    #[serde(default)]
    pub stats: StatsConfig,

    #[serde(default)]
    pub deco: DecoConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Group new and retimed dives into trips automatically
    #[serde(default)]
    pub autogroup: bool,

    /// Dives starting less than this long after the previous one share its trip
    #[serde(default = "default_gap_threshold_sec")]
    pub gap_threshold_sec: i64,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            autogroup: false,
            gap_threshold_sec: default_gap_threshold_sec(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Samples shallower than this are surface time for SAC purposes
    #[serde(default = "default_surface_depth_mm")]
    pub surface_depth_mm: i32,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            surface_depth_mm: default_surface_depth_mm(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecoConfig {
    /// A surface interval this long clears the tissues of earlier dives
    #[serde(default = "default_surface_interval_limit_sec")]
    pub surface_interval_limit_sec: i64,
}

impl Default for DecoConfig {
    fn default() -> Self {
        Self {
            surface_interval_limit_sec: default_surface_interval_limit_sec(),
        }
    }
}

fn default_gap_threshold_sec() -> i64 {
    3 * 24 * 60 * 60
}

fn default_surface_depth_mm() -> i32 {
    DEFAULT_SURFACE_DEPTH_MM
}

fn default_surface_interval_limit_sec() -> i64 {
    48 * 60 * 60
}

impl Config {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml_string()?)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.grouping.gap_threshold_sec <= 0 {
            return Err(Error::Config(
                "grouping.gap_threshold_sec must be positive".to_string(),
            ));
        }
        if self.stats.surface_depth_mm < 0 {
            return Err(Error::Config(
                "stats.surface_depth_mm must not be negative".to_string(),
            ));
        }
        if self.deco.surface_interval_limit_sec <= 0 {
            return Err(Error::Config(
                "deco.surface_interval_limit_sec must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
