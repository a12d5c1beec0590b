//! Icosphere globe meshes generated straight into a memory-mapped chunked file.
//!
//! A [`GlobeMesh`] starts as the 20-face icosahedron and is refined by
//! splitting every face of the latest level into four. New vertices are welded
//! through a [`VertexTable`] so shared edges share midpoints. The face, vertex,
//! and level lists are written in place into the final file image, so a
//! generated mesh needs no serialization step and a saved one is bound back
//! without copying.
//!
//! ```no_run
//! use globe_mesh::GlobeMesh;
//! use std::path::Path;
//!
//! let mesh = GlobeMesh::generate(Path::new("globe.mesh"), 4, None)?;
//! println!("{}", mesh.summary());
//! # Ok::<(), globe_mesh::GlobeError>(())
//! ```

mod color;
mod elevation;
mod error;
mod globe;
mod persist;
mod spherical;
mod tolerance;
mod vertex_table;

pub use color::{
    ABOVE_GLACIER, BEACH, DEEP_OCEAN, GLACIER, LOW_LAND, PLAINS, elev_to_rgb, hsv_to_rgb,
};
pub use elevation::{ElevationGrid, GridShape, TerrainSource, grid_index, map_uv};
pub use error::GlobeError;
pub use globe::{BASE_FACES, GlobeMesh, MeshSummary, SubdivLevel, Triangle};
pub use persist::MeshCapacity;
pub use spherical::{
    DEFAULT_ELEVATION, SphericalCoord, to_cartesian, to_polar, wrap_longitude,
};
pub use tolerance::Tolerance;
pub use vertex_table::VertexTable;
