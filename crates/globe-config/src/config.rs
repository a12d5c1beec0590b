//! Configuration structs with defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Mesh generation settings.
    pub mesh: MeshConfig,
    /// Terrain input and elevation overlay settings.
    pub terrain: TerrainConfig,
    /// Logging and reporting settings.
    pub debug: DebugConfig,
}

/// Mesh generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MeshConfig {
    /// Subdivision passes beyond the base icosahedron.
    pub subdivisions: usize,
    /// Mesh file to generate.
    pub output: PathBuf,
    /// Shrink the generated file to its used length.
    pub truncate_output: bool,
}

/// Terrain grid configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Raw signed 16-bit elevation grid to sample, if any.
    pub grid_path: Option<PathBuf>,
    /// Latitude rows in the grid.
    pub rows: usize,
    /// Longitude columns in the grid.
    pub cols: usize,
    /// Header bytes preceding the samples.
    pub header_bytes: usize,
    /// Per-vertex elevation side file. Written after terrain is sampled,
    /// read when a mesh is loaded without a grid.
    pub elevations_path: Option<PathBuf>,
}

/// Debug/reporting configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Log the per-level mesh summary when done.
    pub print_summary: bool,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            subdivisions: 6,
            output: PathBuf::from("globe.mesh"),
            truncate_output: true,
        }
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            grid_path: None,
            rows: 43_200,
            cols: 86_400,
            header_bytes: 128,
            elevations_path: None,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            print_summary: true,
        }
    }
}

/// Platform config directory for the generator, e.g. `~/.config/icoglobe`.
/// Falls back to the working directory when the platform has none.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("icoglobe"))
        .unwrap_or_else(|| PathBuf::from("."))
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let config = Self::read_file(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized = ron::ser::to_string_pretty(self, pretty)?;

        std::fs::write(&config_path, serialized).map_err(|source| ConfigError::Write {
            path: config_path,
            source,
        })
    }

    /// Re-read the file: `Some(new_config)` if it differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
        let new_config = Self::read_file(&config_path)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
