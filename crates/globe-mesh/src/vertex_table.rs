//! Deduplicating vertex storage.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use glam::{UVec3, Vec3};
use globe_mmap::{ByteArena, RegionError, RegionList};

use crate::spherical::SphericalCoord;
use crate::tolerance::Tolerance;

/// Index key: stored x coordinate in total order, then slot. Every key is
/// distinct, so the map stays a strict ordering even though the weld test
/// itself is not transitive.
#[derive(Clone, Copy, Debug)]
struct WeldKey {
    x: f32,
    slot: u32,
}

impl PartialEq for WeldKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for WeldKey {}

impl PartialOrd for WeldKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WeldKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.x.total_cmp(&other.x).then(self.slot.cmp(&other.slot))
    }
}

/// Vertices in insertion order plus a tolerant index from position to slot.
///
/// Adding a vertex whose position matches an existing one under
/// [`Tolerance::POSITION`] returns the existing index and leaves the list
/// unchanged, so indices are stable and equal to list positions. The list
/// lives in a [`ByteArena`] region; the index is ordinary heap memory.
#[derive(Debug)]
pub struct VertexTable {
    list: RegionList<SphericalCoord>,
    index: BTreeMap<WeldKey, Vec3>,
}

impl VertexTable {
    /// A table that appends into `list`, which is expected to be empty.
    pub fn new(list: RegionList<SphericalCoord>) -> Self {
        Self {
            list,
            index: BTreeMap::new(),
        }
    }

    /// A table over an already filled list, as bound from a loaded file.
    /// The position index is rebuilt so lookups work; if two stored
    /// vertices weld together, lookups return the lower index.
    pub fn rebuild(list: RegionList<SphericalCoord>, arena: &ByteArena) -> Self {
        let index = (0u32..)
            .zip(list.as_slice(arena))
            .map(|(slot, v)| (WeldKey { x: v.pos().x, slot }, v.pos()))
            .collect();
        Self { list, index }
    }

    /// Index of `vertex`, appending it if no equivalent position is stored.
    pub fn add(&mut self, arena: &mut ByteArena, vertex: SphericalCoord) -> Result<u32, RegionError> {
        let pos = vertex.pos();
        if let Some(slot) = self.find(pos) {
            return Ok(slot);
        }
        let slot = u32::try_from(self.list.len()).map_err(|_| RegionError::CapacityExceeded {
            capacity: u32::MAX as usize,
        })?;
        self.list.push(arena, vertex)?;
        self.index.insert(WeldKey { x: pos.x, slot }, pos);
        Ok(slot)
    }

    /// Add three vertices and pack their indices in argument order.
    pub fn add_triangle(
        &mut self,
        arena: &mut ByteArena,
        a: SphericalCoord,
        b: SphericalCoord,
        c: SphericalCoord,
    ) -> Result<UVec3, RegionError> {
        Ok(UVec3::new(
            self.add(arena, a)?,
            self.add(arena, b)?,
            self.add(arena, c)?,
        ))
    }

    /// Index of the vertex at `pos`, if one is stored.
    pub fn find(&self, pos: Vec3) -> Option<u32> {
        let tolerance = Tolerance::POSITION;
        // Widened so rounding in the bounds cannot drop a candidate.
        let reach = 2.0 * tolerance.threshold();
        let lo = WeldKey { x: pos.x - reach, slot: 0 };
        let hi = WeldKey { x: pos.x + reach, slot: u32::MAX };
        self.index
            .range(lo..=hi)
            .filter(|(_, stored)| tolerance.equal_vec3(**stored, pos))
            .map(|(key, _)| key.slot)
            .min()
    }

    /// Checked access by index.
    pub fn get<'a>(&self, arena: &'a ByteArena, index: u32) -> Result<&'a SphericalCoord, RegionError> {
        self.list.get(arena, index as usize)
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.list.capacity()
    }

    pub fn as_slice<'a>(&self, arena: &'a ByteArena) -> &'a [SphericalCoord] {
        self.list.as_slice(arena)
    }

    /// Stored vertices, writable in place. Positions are fixed by
    /// [`SphericalCoord`]; only elevations can be changed through this.
    pub fn as_mut_slice<'a>(&self, arena: &'a mut ByteArena) -> &'a mut [SphericalCoord] {
        self.list.as_mut_slice(arena)
    }

    /// Stop accepting new vertices.
    pub fn seal(&mut self) {
        self.list.seal();
    }

    #[cfg(test)]
    pub(crate) fn list(&self) -> &RegionList<SphericalCoord> {
        &self.list
    }
}
