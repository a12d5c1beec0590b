//! Wiring between configuration and the mesh engine.

use std::path::{Path, PathBuf};

use globe_config::{Config, TerrainConfig};
use globe_mesh::{GlobeError, GlobeMesh, GridShape, MeshSummary, TerrainSource, elev_to_rgb};
use globe_mmap::truncate_file;
use tracing::info;

/// Outcome of one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Mesh file generated or loaded.
    pub path: PathBuf,
    /// Length of that file on disk when the run finished.
    pub file_len: u64,
    pub summary: MeshSummary,
    /// Lowest and highest vertex elevation.
    pub elevation_range: Option<(f32, f32)>,
}

/// Grid shape described by the terrain config.
pub fn grid_shape(terrain: &TerrainConfig) -> GridShape {
    GridShape {
        rows: terrain.rows,
        cols: terrain.cols,
        header_bytes: terrain.header_bytes,
    }
}

/// Generate `config.mesh.output`, or load `load` when given.
///
/// Elevations come from the terrain grid when one is configured, and are then
/// saved to the elevation side file if that is configured too. Without a grid
/// an existing side file is applied instead.
pub fn run(config: &Config, load: Option<&Path>) -> Result<RunReport, GlobeError> {
    let terrain = config
        .terrain
        .grid_path
        .as_ref()
        .map(|path| TerrainSource {
            path: path.clone(),
            shape: grid_shape(&config.terrain),
        });
    let elevations = config.terrain.elevations_path.as_deref();

    let (path, mut mesh) = match load {
        Some(path) => {
            let mut mesh = GlobeMesh::load_from_mesh(path)?;
            if let Some(source) = &terrain {
                mesh.load_from_terrain(&source.path, source.shape)?;
            }
            (path.to_path_buf(), mesh)
        }
        None => {
            let path = config.mesh.output.clone();
            let mesh = GlobeMesh::generate(&path, config.mesh.subdivisions, terrain.as_ref())?;
            (path, mesh)
        }
    };

    match (terrain.is_some(), elevations) {
        (true, Some(elevs)) => {
            mesh.write_elevations(elevs)?;
        }
        (false, Some(elevs)) => mesh.load_elevations(elevs)?,
        (_, None) => {}
    }

    let summary = mesh.summary();
    if config.debug.print_summary {
        info!("\n{summary}");
    }
    let elevation_range = elevation_range(&mesh);
    if let Some((low, high)) = elevation_range {
        info!(
            "Elevations {low} m (rgb {}) to {high} m (rgb {})",
            elev_to_rgb(low),
            elev_to_rgb(high)
        );
    }

    let used = mesh.used_bytes();
    // The mapping must be released before the file can shrink.
    drop(mesh);
    if load.is_none()
        && config.mesh.truncate_output
        && let Some(used) = used
    {
        truncate_file(&path, used as u64)?;
        info!("Truncated {} to {used} bytes", path.display());
    }

    let file_len = std::fs::metadata(&path)
        .map_err(|source| GlobeError::Io {
            path: path.clone(),
            source,
        })?
        .len();

    Ok(RunReport {
        path,
        file_len,
        summary,
        elevation_range,
    })
}

fn elevation_range(mesh: &GlobeMesh) -> Option<(f32, f32)> {
    mesh.vertices().iter().map(|v| v.elev()).fold(None, |range, e| {
        Some(match range {
            None => (e, e),
            Some((low, high)) => (low.min(e), high.max(e)),
        })
    })
}
