//! Configuration for the globe generator.
//!
//! Settings persist to disk as RON and can be overridden from the command
//! line. Every section tolerates missing and unknown fields.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{Config, DebugConfig, MeshConfig, TerrainConfig, default_config_dir};
pub use error::ConfigError;
