use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "dashboard.toml";

// ---------------------------------------------------------------------------
// Application configuration (dashboard.toml)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub filters: FilterConfig,
    pub analysis: AnalysisConfig,
    pub map: MapConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataConfig {
    /// Accident table: `.csv`, `.json` or `.parquet`.
    pub records: PathBuf,
    /// State boundaries: `.geojson`/`.json` or `.shp`.
    pub boundaries: PathBuf,
    /// Boundary property holding the state name (the join key).
    pub join_property: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            records: PathBuf::from("data/accidents_2015_2023.csv"),
            boundaries: PathBuf::from("data/india_states.geojson"),
            join_property: "st_nm".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FilterConfig {
    /// Initial year range, clamped into the loaded years.
    pub default_years: (i32, i32),
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            default_years: (2018, 2022),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Seasonal period of the monthly series.
    pub period: usize,
    /// Minimum monthly points before decomposition is attempted.
    pub min_points: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            period: 12,
            min_points: 24,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapConfig {
    pub bins: usize,
    pub fill_opacity: f32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            bins: 6,
            fill_opacity: 0.7,
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: AppConfig =
            toml::from_str(&content).context("Failed to parse TOML configuration")?;
        Ok(config)
    }

    /// An explicit path must exist; otherwise fall back to `dashboard.toml`
    /// if present, then to the built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load_from_file(default_path)
                } else {
                    log::debug!("No {DEFAULT_CONFIG_FILE} found, using built-in defaults");
                    Ok(Self::default())
                }
            }
        }
    }
}
