use std::path::PathBuf;

use globe_format::FormatError;
use globe_mmap::{MapError, RegionError};

/// Errors returned by mesh generation, loading, and elevation I/O.
#[derive(Debug, thiserror::Error)]
pub enum GlobeError {
    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Region(#[from] RegionError),

    #[error(transparent)]
    Format(#[from] FormatError),

    /// An input file's length disagrees with what the mesh expects.
    #[error("{what} size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        what: &'static str,
        expected: u64,
        actual: u64,
    },

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The requested subdivision depth cannot be laid out in memory or
    /// indexed with 32-bit vertex indices.
    #[error("{subdivisions} subdivisions exceed the addressable mesh size")]
    CapacityOverflow { subdivisions: usize },

    /// An elevation grid with zero rows or columns.
    #[error("elevation grid has no samples ({rows} x {cols})")]
    EmptyGrid { rows: usize, cols: usize },

    /// A loaded file passed format validation but its contents are not a
    /// consistent mesh.
    #[error("corrupt mesh data: {detail}")]
    Corrupt { detail: String },
}
