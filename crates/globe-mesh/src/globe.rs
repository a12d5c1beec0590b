//! The globe mesh: base icosahedron, subdivision levels, and views.

use std::f32::consts::{FRAC_PI_2, PI};
use std::fmt;
use std::ops::Range;
use std::path::Path;

use glam::{UVec3, Vec3};
use globe_format::ChunkRecord;
use globe_mmap::{ByteArena, RegionList};
use tracing::{debug, info, warn};

use crate::error::GlobeError;
use crate::spherical::SphericalCoord;
use crate::vertex_table::VertexTable;

/// Three vertex indices in clockwise order.
pub type Triangle = UVec3;

/// Faces of the base icosahedron.
pub const BASE_FACES: usize = 20;

/// One refinement round: a face range in the global face list and the vertex
/// count reached by the end of the round.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SubdivLevel {
    pub offset_begin: u64,
    pub offset_end: u64,
    pub vertex_end: u64,
}

static_assertions::assert_eq_size!(SubdivLevel, [u8; 24]);

impl SubdivLevel {
    /// Indices of this level's faces.
    pub fn faces(&self) -> Range<usize> {
        self.offset_begin as usize..self.offset_end as usize
    }

    /// Indices of the vertices in use by this level, which includes every
    /// earlier level's.
    pub fn vertices(&self) -> Range<usize> {
        0..self.vertex_end as usize
    }

    pub fn face_count(&self) -> usize {
        self.faces().len()
    }
}

/// Chunk records of the three lists, kept so the headers can be patched.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ChunkLayout {
    pub levels: ChunkRecord,
    pub faces: ChunkRecord,
    pub vertices: ChunkRecord,
}

/// An icosphere whose lists live directly in a chunked file image.
///
/// The backing image is either heap memory, a writable file mapping (during
/// generation), or a private mapping of a previously written file. Every
/// slice handed out borrows the mesh, so none outlives the mapping.
#[derive(Debug)]
pub struct GlobeMesh {
    pub(crate) arena: ByteArena,
    pub(crate) layout: ChunkLayout,
    pub(crate) levels: RegionList<SubdivLevel>,
    pub(crate) faces: RegionList<Triangle>,
    pub(crate) vertices: VertexTable,
    pub(crate) used_bytes: Option<usize>,
}

impl GlobeMesh {
    /// Emit the 20 base triangles as 5 wedges of 4, then close level 0.
    ///
    /// Does nothing if the mesh already has faces.
    pub fn make_globe(&mut self) -> Result<(), GlobeError> {
        if !self.faces.is_empty() || !self.levels.is_empty() {
            warn!(
                "make_globe called on a mesh with {} faces; skipping",
                self.faces.len()
            );
            return Ok(());
        }

        let n_lat = 0.5f32.atan();
        let s_lat = -n_lat;
        let wedge = PI * 0.4;
        let mut east = wedge * 0.5;
        let v = SphericalCoord::from_lat_lon;

        for _ in 0..5 {
            let east2 = east + wedge * 0.5;
            let west = east - wedge;
            let mid = east2 - wedge;

            // North cap, two mid-band triangles, south cap.
            self.push_triangle(v(FRAC_PI_2, (east + west) * 0.5), v(n_lat, east), v(n_lat, west))?;
            self.push_triangle(v(n_lat, east), v(s_lat, mid), v(n_lat, west))?;
            self.push_triangle(v(n_lat, east), v(s_lat, east2), v(s_lat, mid))?;
            self.push_triangle(v(s_lat, mid), v(s_lat, east2), v(-FRAC_PI_2, (mid + east2) * 0.5))?;

            east += wedge;
        }
        self.mark_subdiv()?;

        info!(
            "Base icosahedron built: {} vertices, {} faces",
            self.vertices.len(),
            self.faces.len()
        );
        Ok(())
    }

    fn push_triangle(
        &mut self,
        a: SphericalCoord,
        b: SphericalCoord,
        c: SphericalCoord,
    ) -> Result<(), GlobeError> {
        let tri = self.vertices.add_triangle(&mut self.arena, a, b, c)?;
        self.faces.push(&mut self.arena, tri)?;
        Ok(())
    }

    /// Close the current round: record the faces appended since the previous
    /// level and the vertex count so far.
    pub fn mark_subdiv(&mut self) -> Result<(), GlobeError> {
        let offset_begin = self.last_level().map_or(0, |level| level.offset_end);
        let level = SubdivLevel {
            offset_begin,
            offset_end: self.faces.len() as u64,
            vertex_end: self.vertices.len() as u64,
        };
        self.levels.push(&mut self.arena, level)?;
        debug!(
            "Level {} closed: faces [{}, {}), {} vertices",
            self.levels.len() - 1,
            level.offset_begin,
            level.offset_end,
            level.vertex_end
        );
        Ok(())
    }

    /// Split every face of the latest level into four until `target`
    /// subdivisions exist beyond the base level.
    ///
    /// Without a base level this is a no-op; a mesh already at or past the
    /// target is left unchanged.
    pub fn subdivide(&mut self, target: usize) -> Result<(), GlobeError> {
        let Some(mut last) = self.last_level() else {
            warn!("subdivide called before make_globe; nothing to subdivide");
            return Ok(());
        };

        while self.levels.len() - 1 < target {
            for face in last.faces() {
                let t = *self.faces.get(&self.arena, face)?;
                let a = *self.vertices.get(&self.arena, t.x)?;
                let b = *self.vertices.get(&self.arena, t.y)?;
                let c = *self.vertices.get(&self.arena, t.z)?;

                let ab = self.add_midpoint((a + b) / 2.0)?;
                let bc = self.add_midpoint((b + c) / 2.0)?;
                let ca = self.add_midpoint((c + a) / 2.0)?;

                for child in [
                    UVec3::new(t.x, ab, ca),
                    UVec3::new(ab, t.y, bc),
                    UVec3::new(ca, bc, t.z),
                    UVec3::new(ab, bc, ca),
                ] {
                    self.faces.push(&mut self.arena, child)?;
                }
            }
            self.mark_subdiv()?;
            last = *self.levels.get(&self.arena, self.levels.len() - 1)?;
        }

        info!(
            "Subdivided to {} levels: {} vertices, {} faces",
            self.levels.len(),
            self.vertices.len(),
            self.faces.len()
        );
        Ok(())
    }

    fn add_midpoint(&mut self, pos: Vec3) -> Result<u32, GlobeError> {
        Ok(self
            .vertices
            .add(&mut self.arena, SphericalCoord::from_position(pos))?)
    }

    /// Number of recorded levels, including the base level.
    pub fn subdiv_count(&self) -> usize {
        self.levels.len()
    }

    pub fn levels(&self) -> &[SubdivLevel] {
        self.levels.as_slice(&self.arena)
    }

    fn last_level(&self) -> Option<SubdivLevel> {
        self.levels().last().copied()
    }

    /// Faces of `level`. An index past the last level selects the last one;
    /// a mesh with no levels has no faces.
    pub fn faces_of_level(&self, level: usize) -> &[Triangle] {
        let levels = self.levels();
        let Some(selected) = levels.get(level).or(levels.last()) else {
            return &[];
        };
        self.all_faces()
            .get(selected.faces())
            .unwrap_or_default()
    }

    /// Faces of the most refined level.
    pub fn faces(&self) -> &[Triangle] {
        self.faces_of_level(usize::MAX)
    }

    /// Every face of every level, in generation order.
    pub fn all_faces(&self) -> &[Triangle] {
        self.faces.as_slice(&self.arena)
    }

    /// Every vertex, in index order.
    pub fn vertices(&self) -> &[SphericalCoord] {
        self.vertices.as_slice(&self.arena)
    }

    /// Every vertex, writable. Only elevations can change through
    /// [`SphericalCoord`]'s API.
    pub fn vertices_mut(&mut self) -> &mut [SphericalCoord] {
        self.vertices.as_mut_slice(&mut self.arena)
    }

    /// Vertices referenced by `level` and the levels before it, with the same
    /// clamping as [`Self::faces_of_level`].
    pub fn level_vertices(&self, level: usize) -> &[SphericalCoord] {
        let levels = self.levels();
        let Some(selected) = levels.get(level).or(levels.last()) else {
            return &[];
        };
        self.vertices()
            .get(selected.vertices())
            .unwrap_or_default()
    }

    /// Checked vertex access.
    pub fn vertex(&self, index: u32) -> Result<&SphericalCoord, GlobeError> {
        Ok(self.vertices.get(&self.arena, index)?)
    }

    /// Index of the vertex at `pos`, if the mesh has one there.
    pub fn find_vertex(&self, pos: Vec3) -> Option<u32> {
        self.vertices.find(pos)
    }

    pub fn vertex_table(&self) -> &VertexTable {
        &self.vertices
    }

    /// The chunked file image backing the mesh, header included.
    pub fn file_bytes(&self) -> &[u8] {
        self.arena.bytes()
    }

    /// Path of the backing file, if the mesh is file-backed.
    pub fn path(&self) -> Option<&Path> {
        self.arena.mapping().map(|m| m.path())
    }

    pub fn summary(&self) -> MeshSummary {
        MeshSummary {
            vertices: self.vertices.len(),
            faces: self.faces.len(),
            levels: self.levels().iter().map(SubdivLevel::faces).collect(),
        }
    }
}

/// Counts and per-level face ranges of a mesh.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MeshSummary {
    pub vertices: usize,
    pub faces: usize,
    pub levels: Vec<Range<usize>>,
}

impl fmt::Display for MeshSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Vertices: [{}], Faces: [{}] in {} subdivs:",
            self.vertices,
            self.faces,
            self.levels.len()
        )?;
        for range in &self.levels {
            writeln!(f, "{:>16} [{}, {}]", range.len(), range.start, range.end)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn base() -> GlobeMesh {
        let mut mesh = GlobeMesh::with_capacity(0).unwrap();
        mesh.make_globe().unwrap();
        mesh
    }

    #[test]
    fn test_base_icosahedron_topology() {
        let mesh = base();
        assert_eq!(mesh.vertices().len(), 12, "icosahedron has 12 vertices");
        assert_eq!(mesh.all_faces().len(), 20);
        assert_eq!(mesh.subdiv_count(), 1);
        assert_eq!(
            mesh.levels()[0],
            SubdivLevel {
                offset_begin: 0,
                offset_end: 20,
                vertex_end: 12
            }
        );

        let mut edges = HashSet::new();
        for t in mesh.all_faces() {
            for (a, b) in [(t.x, t.y), (t.y, t.z), (t.z, t.x)] {
                assert_ne!(a, b, "degenerate triangle {t}");
                edges.insert((a.min(b), a.max(b)));
            }
        }
        assert_eq!(edges.len(), 30, "icosahedron has 30 edges");
    }

    #[test]
    fn test_base_vertices_on_unit_sphere() {
        let mesh = base();
        for v in mesh.vertices() {
            assert!((v.pos().length() - 1.0).abs() < 1e-6, "off sphere: {v}");
            assert_eq!(v.elev(), 1.0);
        }
        let poles = mesh
            .vertices()
            .iter()
            .filter(|v| v.pos().y.abs() > 0.999)
            .count();
        assert_eq!(poles, 2, "five cap triangles share each pole");
    }

    #[test]
    fn test_base_winding_is_consistent() {
        let mesh = base();
        let verts = mesh.vertices();
        let signs: HashSet<bool> = mesh
            .all_faces()
            .iter()
            .map(|t| {
                let (a, b, c) = (
                    verts[t.x as usize].pos(),
                    verts[t.y as usize].pos(),
                    verts[t.z as usize].pos(),
                );
                (b - a).cross(c - a).dot(a + b + c) > 0.0
            })
            .collect();
        assert_eq!(signs.len(), 1, "all faces wind the same way");
    }

    #[test]
    fn test_one_subdivision_welds_midpoints() {
        let mut mesh = GlobeMesh::with_capacity(1).unwrap();
        mesh.make_globe().unwrap();
        mesh.subdivide(1).unwrap();

        assert_eq!(mesh.vertices().len(), 42, "12 corners + 30 edge midpoints");
        assert_eq!(mesh.all_faces().len(), 100);
        assert_eq!(mesh.levels()[1].faces(), 20..100);
        assert_eq!(mesh.levels()[1].vertex_end, 42);
    }

    #[test]
    fn test_child_triangle_pattern() {
        let mut mesh = GlobeMesh::with_capacity(1).unwrap();
        mesh.make_globe().unwrap();
        let parent = mesh.all_faces()[0];
        mesh.subdivide(1).unwrap();

        let children = &mesh.faces_of_level(1)[..4];
        let (ab, bc, ca) = (children[0].y, children[1].z, children[0].z);
        assert_eq!(children[0], UVec3::new(parent.x, ab, ca));
        assert_eq!(children[1], UVec3::new(ab, parent.y, bc));
        assert_eq!(children[2], UVec3::new(ca, bc, parent.z));
        assert_eq!(children[3], UVec3::new(ab, bc, ca));

        let v = mesh.vertices();
        let expected = (v[parent.x as usize] + v[parent.y as usize]).normalize();
        assert!((v[ab as usize].pos() - expected).length() < 1e-6);
    }

    #[test]
    fn test_subdivide_is_idempotent_at_target() {
        let mut mesh = GlobeMesh::with_capacity(2).unwrap();
        mesh.make_globe().unwrap();
        mesh.subdivide(1).unwrap();
        mesh.subdivide(1).unwrap();
        mesh.subdivide(0).unwrap();
        assert_eq!(mesh.subdiv_count(), 2);
        assert_eq!(mesh.all_faces().len(), 100);
    }

    #[test]
    fn test_subdivide_without_base_is_noop() {
        let mut mesh = GlobeMesh::with_capacity(1).unwrap();
        mesh.subdivide(1).unwrap();
        assert_eq!(mesh.subdiv_count(), 0);
        assert!(mesh.all_faces().is_empty());
        assert!(mesh.faces().is_empty());
        assert!(mesh.level_vertices(0).is_empty());
    }

    #[test]
    fn test_make_globe_twice_is_noop() {
        let mut mesh = base();
        mesh.make_globe().unwrap();
        assert_eq!(mesh.all_faces().len(), 20);
        assert_eq!(mesh.subdiv_count(), 1);
    }

    #[test]
    fn test_subdivide_past_capacity_fails() {
        let mut mesh = GlobeMesh::with_capacity(1).unwrap();
        mesh.make_globe().unwrap();
        let err = mesh.subdivide(2).unwrap_err();
        assert!(
            matches!(err, GlobeError::Region(_)),
            "expected a capacity error, got {err:?}"
        );
    }

    #[test]
    fn test_level_views_clamp() {
        let mut mesh = GlobeMesh::with_capacity(2).unwrap();
        mesh.make_globe().unwrap();
        mesh.subdivide(2).unwrap();

        assert_eq!(mesh.faces_of_level(0).len(), 20);
        assert_eq!(mesh.faces_of_level(1).len(), 80);
        assert_eq!(mesh.faces_of_level(2).len(), 320);
        assert_eq!(mesh.faces_of_level(7), mesh.faces_of_level(2));
        assert_eq!(mesh.faces(), mesh.faces_of_level(2));

        assert_eq!(mesh.level_vertices(0).len(), 12);
        assert_eq!(mesh.level_vertices(1).len(), 42);
        assert_eq!(mesh.level_vertices(2).len(), 162);
    }

    #[test]
    fn test_find_vertex() {
        let mesh = base();
        let north = mesh.find_vertex(Vec3::Y).expect("north pole is a vertex");
        assert!(mesh.vertex(north).unwrap().lat() > 1.57);
        assert!(mesh.vertex(999).is_err());
    }

    #[test]
    fn test_summary_format() {
        let mut mesh = GlobeMesh::with_capacity(1).unwrap();
        mesh.make_globe().unwrap();
        mesh.subdivide(1).unwrap();

        let summary = mesh.summary();
        assert_eq!(summary.levels, vec![0..20, 20..100]);
        let text = summary.to_string();
        assert!(text.starts_with("Vertices: [42], Faces: [100] in 2 subdivs:\n"));
        assert!(text.contains("              80 [20, 100]\n"));
    }
}
