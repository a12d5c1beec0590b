//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Globe mesh generator arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "globe", about = "Generate or inspect icosphere globe meshes")]
pub struct CliArgs {
    /// Subdivision passes beyond the base icosahedron.
    #[arg(long)]
    pub subdivisions: Option<usize>,

    /// Mesh file to generate.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Raw terrain grid to sample onto the vertices.
    #[arg(long)]
    pub terrain: Option<PathBuf>,

    /// Per-vertex elevation side file.
    #[arg(long)]
    pub elevations: Option<PathBuf>,

    /// Load an existing mesh file instead of generating one.
    #[arg(long)]
    pub load: Option<PathBuf>,

    /// Keep the generated file at its reserved size.
    #[arg(long)]
    pub no_truncate: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(n) = args.subdivisions {
            self.mesh.subdivisions = n;
        }
        if let Some(ref output) = args.output {
            self.mesh.output = output.clone();
        }
        if args.no_truncate {
            self.mesh.truncate_output = false;
        }
        if let Some(ref grid) = args.terrain {
            self.terrain.grid_path = Some(grid.clone());
        }
        if let Some(ref elevs) = args.elevations {
            self.terrain.elevations_path = Some(elevs.clone());
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
