//! Terrain sampling and the per-vertex elevation side file.

use std::borrow::Cow;
use std::f32::consts::{PI, TAU};
use std::path::{Path, PathBuf};

use glam::Vec2;
use globe_mmap::MappedFile;
use tracing::{info, trace};

use crate::error::GlobeError;
use crate::globe::GlobeMesh;

/// Dimensions of a raw elevation grid file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridShape {
    /// Latitude rows, south to north.
    pub rows: usize,
    /// Longitude columns, west to east.
    pub cols: usize,
    /// Bytes skipped at the start of the file.
    pub header_bytes: usize,
}

impl GridShape {
    /// The 1/240-degree global grid: 43200 x 86400 samples after a 128-byte header.
    pub const GLOBAL: Self = Self {
        rows: 43_200,
        cols: 86_400,
        header_bytes: 0o200,
    };

    pub fn sample_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Bytes of sample data, excluding the header.
    pub fn data_bytes(&self) -> usize {
        self.sample_count() * size_of::<i16>()
    }
}

impl Default for GridShape {
    fn default() -> Self {
        Self::GLOBAL
    }
}

/// A terrain grid file and its shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerrainSource {
    pub path: PathBuf,
    pub shape: GridShape,
}

/// Map `(lat, lon)` in radians onto `[0, 1]` in both axes.
pub fn map_uv(uv: Vec2) -> Vec2 {
    Vec2::new(uv.x / PI + 0.5, uv.y / TAU + 0.5)
}

/// Grid index for a unit coordinate: `floor(unit * len) - 1`, clamped into
/// `[0, len - 1]`.
pub fn grid_index(unit: f32, len: usize) -> usize {
    let idx = unit * len as f32 - 1.0;
    if idx > 0.0 {
        (idx as usize).min(len.saturating_sub(1))
    } else {
        0
    }
}

/// Row-major signed 16-bit elevations in meters.
#[derive(Clone, Copy, Debug)]
pub struct ElevationGrid<'a> {
    samples: &'a [i16],
    shape: GridShape,
}

impl<'a> ElevationGrid<'a> {
    /// Wrap `samples`, which must hold exactly `rows * cols` values.
    pub fn new(samples: &'a [i16], shape: GridShape) -> Result<Self, GlobeError> {
        if shape.rows == 0 || shape.cols == 0 {
            return Err(GlobeError::EmptyGrid {
                rows: shape.rows,
                cols: shape.cols,
            });
        }
        if samples.len() != shape.sample_count() {
            return Err(GlobeError::SizeMismatch {
                what: "elevation grid",
                expected: shape.data_bytes() as u64,
                actual: (samples.len() * size_of::<i16>()) as u64,
            });
        }
        Ok(Self { samples, shape })
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    /// `(row, col)` of the sample nearest to `(lat, lon)`.
    pub fn cell_of(&self, uv: Vec2) -> (usize, usize) {
        let unit = map_uv(uv);
        (
            grid_index(unit.x, self.shape.rows),
            grid_index(unit.y, self.shape.cols),
        )
    }

    pub fn sample(&self, row: usize, col: usize) -> Option<i16> {
        if row >= self.shape.rows || col >= self.shape.cols {
            return None;
        }
        self.samples.get(row * self.shape.cols + col).copied()
    }
}

impl GlobeMesh {
    /// Overwrite every vertex's elevation with its nearest grid sample.
    pub fn map_elevations(&mut self, grid: &ElevationGrid<'_>) {
        for (i, v) in self.vertices_mut().iter_mut().enumerate() {
            let (row, col) = grid.cell_of(v.uv());
            // cell_of clamps into the validated shape.
            let elev = f32::from(grid.sample(row, col).unwrap_or_default());
            v.set_elev(elev);

            if i < 50 || i % 1000 == 0 {
                trace!("vertex {i}: uv {} -> [{row}, {col}] = {elev}", v.uv());
            }
        }
    }

    /// Map a raw terrain grid file and sample it onto every vertex.
    ///
    /// The file must be exactly `shape.header_bytes` plus the grid's sample
    /// bytes long; otherwise nothing is sampled.
    pub fn load_from_terrain(&mut self, path: &Path, shape: GridShape) -> Result<(), GlobeError> {
        let file = MappedFile::open(path)?;
        let expected = shape.data_bytes();
        let actual = file.len().saturating_sub(shape.header_bytes);
        if file.len() < shape.header_bytes || actual != expected {
            return Err(GlobeError::SizeMismatch {
                what: "terrain grid",
                expected: expected as u64,
                actual: actual as u64,
            });
        }

        let data = &file.bytes()[shape.header_bytes..];
        let samples: Cow<'_, [i16]> = match bytemuck::try_cast_slice(data) {
            Ok(samples) => Cow::Borrowed(samples),
            // Odd header sizes leave the samples unaligned.
            Err(_) => Cow::Owned(
                data.chunks_exact(2)
                    .map(|b| i16::from_le_bytes([b[0], b[1]]))
                    .collect(),
            ),
        };

        let grid = ElevationGrid::new(&samples, shape)?;
        self.map_elevations(&grid);
        info!(
            "Sampled {} terrain onto {} vertices",
            path.display(),
            self.vertices().len()
        );
        Ok(())
    }

    /// Write one `f32` per vertex, in index order, to `path`.
    pub fn write_elevations(&self, path: &Path) -> Result<usize, GlobeError> {
        let elevs: Vec<f32> = self.vertices().iter().map(|v| v.elev()).collect();
        std::fs::write(path, bytemuck::cast_slice::<f32, u8>(&elevs)).map_err(|source| {
            GlobeError::Io {
                path: path.to_path_buf(),
                source,
            }
        })?;
        info!("Wrote {} elevations to {}", elevs.len(), path.display());
        Ok(elevs.len())
    }

    /// Read a file written by [`Self::write_elevations`] back onto the
    /// vertices. Fails without changes unless it holds exactly one value per
    /// vertex.
    pub fn load_elevations(&mut self, path: &Path) -> Result<(), GlobeError> {
        let file = MappedFile::open(path)?;
        let expected = self.vertices().len() * size_of::<f32>();
        if file.len() != expected {
            return Err(GlobeError::SizeMismatch {
                what: "elevation file",
                expected: expected as u64,
                actual: file.len() as u64,
            });
        }

        let elevs = file
            .bytes()
            .chunks_exact(size_of::<f32>())
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]));
        for (v, elev) in self.vertices_mut().iter_mut().zip(elevs) {
            v.set_elev(elev);
        }
        info!("Loaded elevations from {}", path.display());
        Ok(())
    }
}
