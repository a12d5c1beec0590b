//! Laying a mesh out as a chunked file image, finishing it, and loading it back.

use std::path::Path;

use globe_format::{
    CHUNK_HEADER_BYTES, ChunkType, FILE_HEADER_BYTES, allocate_chunk, finish_chunks, read_chunk,
    read_eof, read_file_header, write_file_header,
};
use globe_mmap::{ByteArena, MappedBuffer, RegionList};
use tracing::info;

use crate::elevation::TerrainSource;
use crate::error::GlobeError;
use crate::globe::{BASE_FACES, ChunkLayout, GlobeMesh, SubdivLevel, Triangle};
use crate::spherical::SphericalCoord;
use crate::vertex_table::VertexTable;

/// Vertices reserved per face of the final level. A closed triangle mesh has
/// half as many vertices as faces, plus two.
const VERTEX_ESTIMATE_RATIO: f64 = 0.501;

/// Extra vertex slots on top of the ratio.
const VERTEX_ESTIMATE_SLACK: usize = 10;

/// Element counts to reserve for a mesh with a given subdivision depth.
///
/// Level and face counts are exact. The vertex count is an upper-bound
/// estimate that is trimmed when the file is finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshCapacity {
    pub levels: usize,
    pub faces: usize,
    pub vertices: usize,
}

impl MeshCapacity {
    /// Capacity for the base level plus `nsubdivs` subdivisions, or `None` if
    /// the counts overflow or need more than 32-bit vertex indices.
    pub fn for_subdivisions(nsubdivs: usize) -> Option<Self> {
        let levels = nsubdivs.checked_add(1)?;
        let mut level_faces = BASE_FACES;
        let mut faces = BASE_FACES;
        for _ in 0..nsubdivs {
            level_faces = level_faces.checked_mul(4)?;
            faces = faces.checked_add(level_faces)?;
        }

        let vertices = (level_faces as f64 * VERTEX_ESTIMATE_RATIO) as usize + VERTEX_ESTIMATE_SLACK;
        u32::try_from(vertices).ok()?;

        Some(Self {
            levels,
            faces,
            vertices,
        })
    }

    /// Bytes for the file header, three chunk headers with their payloads,
    /// and the end-of-file marker.
    pub fn file_len(&self) -> Option<usize> {
        let payload = self
            .levels
            .checked_mul(size_of::<SubdivLevel>())?
            .checked_add(self.faces.checked_mul(size_of::<Triangle>())?)?
            .checked_add(self.vertices.checked_mul(size_of::<SphericalCoord>())?)?;
        payload.checked_add(FILE_HEADER_BYTES + 4 * CHUNK_HEADER_BYTES)
    }
}

impl GlobeMesh {
    /// Generate a mesh with `nsubdivs` subdivisions directly into a new file
    /// at `path`, then sample terrain onto it if a source is given.
    ///
    /// The file is created at its estimated size and the chunk headers are
    /// patched to the exact counts before this returns. The file keeps its
    /// slack; [`Self::used_bytes`] reports where it may be truncated once the
    /// mesh is dropped. A failure part-way leaves an incomplete file behind.
    pub fn generate(
        path: &Path,
        nsubdivs: usize,
        terrain: Option<&TerrainSource>,
    ) -> Result<Self, GlobeError> {
        let capacity = plan(nsubdivs)?;
        let len = capacity
            .file_len()
            .ok_or(GlobeError::CapacityOverflow {
                subdivisions: nsubdivs,
            })?;

        info!(
            "Generating {} with {nsubdivs} subdivisions ({len} bytes reserved)",
            path.display()
        );
        let buffer = MappedBuffer::create(path, len)?;
        let mut mesh = Self::lay_out(ByteArena::mapped(buffer), &capacity)?;
        mesh.build(nsubdivs)?;

        if let Some(source) = terrain {
            mesh.load_from_terrain(&source.path, source.shape)?;
        }
        Ok(mesh)
    }

    /// Same as [`Self::generate`] without terrain, over heap memory.
    pub fn in_memory(nsubdivs: usize) -> Result<Self, GlobeError> {
        let mut mesh = Self::with_capacity(nsubdivs)?;
        mesh.build(nsubdivs)?;
        Ok(mesh)
    }

    /// An empty heap-backed mesh with room for `nsubdivs` subdivisions.
    /// Call [`Self::make_globe`], [`Self::subdivide`], and [`Self::finish`]
    /// to fill it.
    pub fn with_capacity(nsubdivs: usize) -> Result<Self, GlobeError> {
        let capacity = plan(nsubdivs)?;
        let len = capacity
            .file_len()
            .ok_or(GlobeError::CapacityOverflow {
                subdivisions: nsubdivs,
            })?;
        Self::lay_out(ByteArena::heap(len), &capacity)
    }

    fn lay_out(mut arena: ByteArena, capacity: &MeshCapacity) -> Result<Self, GlobeError> {
        write_file_header(&mut arena)?;
        let layout = ChunkLayout {
            levels: allocate_chunk::<SubdivLevel>(&mut arena, ChunkType::SubdivInfo, capacity.levels)?,
            faces: allocate_chunk::<Triangle>(&mut arena, ChunkType::Faces, capacity.faces)?,
            vertices: allocate_chunk::<SphericalCoord>(&mut arena, ChunkType::Verts, capacity.vertices)?,
        };

        Ok(Self {
            levels: RegionList::new(layout.levels.payload),
            faces: RegionList::new(layout.faces.payload),
            vertices: VertexTable::new(RegionList::new(layout.vertices.payload)),
            arena,
            layout,
            used_bytes: None,
        })
    }

    fn build(&mut self, nsubdivs: usize) -> Result<(), GlobeError> {
        self.make_globe()?;
        self.subdivide(nsubdivs)?;
        self.finish()?;
        Ok(())
    }

    /// Patch the chunk headers to the counts actually produced and write the
    /// end-of-file marker. The lists stop accepting appends.
    ///
    /// Returns the byte length of the finished image; anything past it is
    /// unused reservation.
    pub fn finish(&mut self) -> Result<usize, GlobeError> {
        let chunks = [
            (self.layout.levels, self.levels.len()),
            (self.layout.faces, self.faces.len()),
            (self.layout.vertices, self.vertices.len()),
        ];
        let end = finish_chunks(&mut self.arena, &chunks)?;

        self.levels.seal();
        self.faces.seal();
        self.vertices.seal();
        self.used_bytes = Some(end);

        info!(
            "Mesh finished: {} vertices of {} reserved, {end} of {} bytes used",
            self.vertices.len(),
            self.vertices.capacity(),
            self.arena.len()
        );
        Ok(end)
    }

    /// Byte length of the finished image, or `None` before [`Self::finish`].
    pub fn used_bytes(&self) -> Option<usize> {
        self.used_bytes
    }

    /// Bind a mesh onto a file written by [`Self::generate`].
    ///
    /// The file is mapped copy-on-write: nothing is copied out of it and it is
    /// never modified, though elevations may be overlaid in memory. Every
    /// header is validated before any list is bound.
    pub fn load_from_mesh(path: &Path) -> Result<Self, GlobeError> {
        let buffer = MappedBuffer::open_private(path)?;
        let mut arena = ByteArena::mapped(buffer);

        let header = read_file_header(&mut arena)?;
        let layout = ChunkLayout {
            levels: read_chunk::<SubdivLevel>(&mut arena, ChunkType::SubdivInfo)?,
            faces: read_chunk::<Triangle>(&mut arena, ChunkType::Faces)?,
            vertices: read_chunk::<SphericalCoord>(&mut arena, ChunkType::Verts)?,
        };
        read_eof(&mut arena)?;
        let end = arena.cursor();

        validate(&arena, &layout)?;

        let vertex_list = RegionList::fully_loaded(layout.vertices.payload);
        let mesh = Self {
            levels: RegionList::fully_loaded(layout.levels.payload),
            faces: RegionList::fully_loaded(layout.faces.payload),
            vertices: VertexTable::rebuild(vertex_list, &arena),
            arena,
            layout,
            used_bytes: Some(end),
        };

        info!(
            "Loaded {} (version 0x{:04x}): {} vertices, {} faces, {} levels",
            path.display(),
            header.version_id,
            mesh.vertices.len(),
            mesh.faces.len(),
            mesh.levels.len()
        );
        Ok(mesh)
    }
}

fn plan(nsubdivs: usize) -> Result<MeshCapacity, GlobeError> {
    MeshCapacity::for_subdivisions(nsubdivs).ok_or(GlobeError::CapacityOverflow {
        subdivisions: nsubdivs,
    })
}

/// Check that level ranges tile the face list and that faces only reference
/// stored vertices.
fn validate(arena: &ByteArena, layout: &ChunkLayout) -> Result<(), GlobeError> {
    let corrupt = |detail: String| Err(GlobeError::Corrupt { detail });

    let levels = RegionList::<SubdivLevel>::fully_loaded(layout.levels.payload);
    let faces = RegionList::<Triangle>::fully_loaded(layout.faces.payload);
    let vertex_count = layout.vertices.payload.capacity;
    if u32::try_from(vertex_count).is_err() {
        return corrupt(format!("{vertex_count} vertices exceed 32-bit indices"));
    }

    let mut expected_begin = 0u64;
    let mut previous_vertex_end = 0u64;
    for (i, level) in levels.as_slice(arena).iter().enumerate() {
        if level.offset_begin != expected_begin || level.offset_end < level.offset_begin {
            return corrupt(format!(
                "level {i} spans [{}, {}), expected to start at {expected_begin}",
                level.offset_begin, level.offset_end
            ));
        }
        if level.vertex_end < previous_vertex_end || level.vertex_end > vertex_count as u64 {
            return corrupt(format!(
                "level {i} ends at vertex {} of {vertex_count}",
                level.vertex_end
            ));
        }
        expected_begin = level.offset_end;
        previous_vertex_end = level.vertex_end;
    }
    if expected_begin != faces.len() as u64 {
        return corrupt(format!(
            "levels cover {expected_begin} faces, file holds {}",
            faces.len()
        ));
    }

    if let Some((i, t)) = faces
        .as_slice(arena)
        .iter()
        .enumerate()
        .find(|(_, t)| t.max_element() as usize >= vertex_count)
    {
        return corrupt(format!("face {i} {t} references a missing vertex"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use globe_format::{ChunkHeader, FileHeader};

    use super::*;

    #[test]
    fn test_capacity_closed_form() {
        let cap = MeshCapacity::for_subdivisions(0).unwrap();
        assert_eq!((cap.levels, cap.faces, cap.vertices), (1, 20, 20));

        let cap = MeshCapacity::for_subdivisions(2).unwrap();
        assert_eq!(cap.levels, 3);
        assert_eq!(cap.faces, 420);
        assert_eq!(cap.vertices, 170);

        for n in 0..8 {
            let cap = MeshCapacity::for_subdivisions(n).unwrap();
            assert_eq!(cap.faces, 20 * (4usize.pow(n as u32 + 1) - 1) / 3);
            let final_vertices = 10 * 4usize.pow(n as u32) + 2;
            assert!(cap.vertices >= final_vertices, "estimate too small at {n}");
        }
    }

    #[test]
    fn test_capacity_file_len() {
        let cap = MeshCapacity::for_subdivisions(1).unwrap();
        assert_eq!(cap.file_len(), Some(16 + 96 + 2 * 24 + 100 * 12 + 50 * 24));
    }

    #[test]
    fn test_capacity_overflow() {
        assert_eq!(MeshCapacity::for_subdivisions(40), None);
        assert!(matches!(
            GlobeMesh::with_capacity(usize::MAX),
            Err(GlobeError::CapacityOverflow { .. })
        ));
    }

    #[test]
    fn test_generate_in_memory_levels() {
        let mesh = GlobeMesh::in_memory(2).unwrap();
        assert_eq!(mesh.all_faces().len(), 420);
        assert_eq!(mesh.summary().levels, vec![0..20, 20..100, 100..420]);
        assert_eq!(mesh.vertices().len(), 162);
    }

    #[test]
    fn test_default_depth_welds_every_shared_vertex() {
        let mesh = GlobeMesh::in_memory(6).unwrap();
        assert_eq!(mesh.vertices().len(), 10 * 4usize.pow(6) + 2);
        for (i, v) in (0u32..).zip(mesh.vertices()) {
            assert_eq!(mesh.find_vertex(v.pos()), Some(i), "vertex {i} at {v}");
        }
        let levels = mesh.summary().levels;
        assert_eq!(levels.len(), 7);
        assert_eq!(levels[6].end, 20 * (4usize.pow(7) - 1) / 3);
    }

    #[test]
    fn test_finish_patches_headers() {
        let mesh = GlobeMesh::in_memory(2).unwrap();
        let bytes = mesh.file_bytes();
        let read = |offset: usize| -> ChunkHeader {
            bytemuck::pod_read_unaligned(&bytes[offset..offset + CHUNK_HEADER_BYTES])
        };

        let levels = read(mesh.layout.levels.header_offset);
        let faces = read(mesh.layout.faces.header_offset);
        let verts = read(mesh.layout.vertices.header_offset);
        assert_eq!(levels.data_count, 3);
        assert_eq!(faces.data_count, 420);
        assert_eq!(verts.data_count, 162, "estimate replaced by actual count");
        for h in [levels, faces, verts] {
            assert_eq!(h.data_size, h.data_count * u64::from(h.data_stride));
        }

        let end = mesh.used_bytes().unwrap();
        let eof = read(end - CHUNK_HEADER_BYTES);
        assert_eq!(eof.kind(), Some(ChunkType::Eof));
        assert_eq!(end, 16 + 4 * 24 + 3 * 24 + 420 * 12 + 162 * 24);
        assert!(end < bytes.len(), "vertex slack is left after the marker");

        let file: FileHeader = bytemuck::pod_read_unaligned(&bytes[..FILE_HEADER_BYTES]);
        assert_eq!(file.data_bytes as usize, end - FILE_HEADER_BYTES);
    }

    #[test]
    fn test_finished_mesh_rejects_appends() {
        let mut mesh = GlobeMesh::in_memory(0).unwrap();
        let err = mesh.mark_subdiv().unwrap_err();
        assert!(matches!(err, GlobeError::Region(globe_mmap::RegionError::Sealed)));
    }

    #[test]
    fn test_generate_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.mesh");

        let generated = GlobeMesh::generate(&path, 1, None).unwrap();
        assert_eq!(generated.path(), Some(path.as_path()));
        let faces = generated.all_faces().to_vec();
        drop(generated);

        let loaded = GlobeMesh::load_from_mesh(&path).unwrap();
        assert_eq!(loaded.all_faces(), faces.as_slice());
        assert_eq!(loaded.vertices().len(), 42);
        assert_eq!(loaded.subdiv_count(), 2);
    }

    #[test]
    fn test_load_rejects_unfinished_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.mesh");

        // Header and chunks laid out but never patched.
        let mesh = GlobeMesh::with_capacity(1).unwrap();
        std::fs::write(&path, mesh.file_bytes()).unwrap();

        assert!(GlobeMesh::load_from_mesh(&path).is_err());
    }

    #[test]
    fn test_load_rejects_overlapping_levels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad-levels.mesh");

        let mesh = GlobeMesh::in_memory(1).unwrap();
        let mut bytes = mesh.file_bytes()[..mesh.used_bytes().unwrap()].to_vec();
        // Second level's offset_begin.
        let offset = mesh.layout.levels.payload.offset + 24;
        bytes[offset..offset + 8].copy_from_slice(&5u64.to_le_bytes());
        std::fs::write(&path, &bytes).unwrap();

        let err = GlobeMesh::load_from_mesh(&path).unwrap_err();
        assert!(matches!(err, GlobeError::Corrupt { .. }), "got {err:?}");
    }
}
