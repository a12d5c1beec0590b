//! Fixed-capacity append-only list stored inside an arena region.

use std::marker::PhantomData;
use std::mem::size_of;

use bytemuck::Pod;

use crate::arena::{ByteArena, Region};
use crate::error::RegionError;

/// An append-only sequence of `T` living in a pre-reserved [`Region`].
///
/// The list only records where its elements are and how many are filled; the
/// bytes themselves belong to the [`ByteArena`] that every accessor takes.
/// Appending past the reserved capacity is an error, never a reallocation.
#[derive(Debug)]
pub struct RegionList<T> {
    region: Region,
    len: usize,
    sealed: bool,
    _marker: PhantomData<T>,
}

impl<T: Pod> RegionList<T> {
    /// An empty, appendable list over `region`.
    pub fn new(region: Region) -> Self {
        debug_assert_eq!(region.stride, size_of::<T>());
        Self {
            region,
            len: 0,
            sealed: false,
            _marker: PhantomData,
        }
    }

    /// A list bound to a region that is already full, as when loading a file.
    /// The list reports every slot as filled and rejects appends.
    pub fn fully_loaded(region: Region) -> Self {
        debug_assert_eq!(region.stride, size_of::<T>());
        Self {
            region,
            len: region.capacity,
            sealed: true,
            _marker: PhantomData,
        }
    }

    /// The backing region.
    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Number of filled elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no element has been filled.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of elements the region was reserved for.
    pub fn capacity(&self) -> usize {
        self.region.capacity
    }

    /// Returns `true` if the list no longer accepts appends.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Stop accepting appends. The filled elements stay readable.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Append `value`, returning its index.
    pub fn push(&mut self, arena: &mut ByteArena, value: T) -> Result<usize, RegionError> {
        if self.sealed {
            return Err(RegionError::Sealed);
        }
        if self.len == self.region.capacity {
            return Err(RegionError::CapacityExceeded {
                capacity: self.region.capacity,
            });
        }

        let index = self.len;
        let offset = self.region.offset + index * self.region.stride;
        arena.write(offset, &value)?;
        self.len += 1;
        Ok(index)
    }

    /// Checked element access.
    pub fn get<'a>(&self, arena: &'a ByteArena, index: usize) -> Result<&'a T, RegionError> {
        self.as_slice(arena)
            .get(index)
            .ok_or(RegionError::OutOfBounds {
                index,
                len: self.len,
            })
    }

    /// The filled elements.
    pub fn as_slice<'a>(&self, arena: &'a ByteArena) -> &'a [T] {
        arena.typed(&self.region, self.len)
    }

    /// The filled elements, writable in place.
    pub fn as_mut_slice<'a>(&self, arena: &'a mut ByteArena) -> &'a mut [T] {
        arena.typed_mut(&self.region, self.len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_of(capacity: usize) -> (ByteArena, RegionList<u32>) {
        let mut arena = ByteArena::heap(capacity * 4);
        let region = arena.allocate::<u32>(capacity).unwrap();
        (arena, RegionList::new(region))
    }

    #[test]
    fn test_push_returns_sequential_indices() {
        let (mut arena, mut list) = list_of(3);
        assert_eq!(list.push(&mut arena, 10).unwrap(), 0);
        assert_eq!(list.push(&mut arena, 20).unwrap(), 1);
        assert_eq!(list.len(), 2);
        assert_eq!(list.as_slice(&arena), &[10, 20]);
    }

    #[test]
    fn test_push_past_capacity_fails() {
        let (mut arena, mut list) = list_of(2);
        list.push(&mut arena, 1).unwrap();
        list.push(&mut arena, 2).unwrap();

        let err = list.push(&mut arena, 3).unwrap_err();
        assert_eq!(err, RegionError::CapacityExceeded { capacity: 2 });
        assert_eq!(list.len(), 2, "failed push must not grow the list");
    }

    #[test]
    fn test_fully_loaded_list_is_full_and_sealed() {
        let mut arena = ByteArena::heap(12);
        let region = arena.allocate::<u32>(3).unwrap();
        arena.write(0, &7u32).unwrap();
        arena.write(8, &9u32).unwrap();

        let mut list = RegionList::<u32>::fully_loaded(region);
        assert_eq!(list.len(), 3);
        assert!(list.is_sealed());
        assert_eq!(list.as_slice(&arena), &[7, 0, 9]);
        assert_eq!(list.push(&mut arena, 1).unwrap_err(), RegionError::Sealed);
    }

    #[test]
    fn test_get_is_bounds_checked() {
        let (mut arena, mut list) = list_of(4);
        list.push(&mut arena, 5).unwrap();

        assert_eq!(*list.get(&arena, 0).unwrap(), 5);
        // Index 1 is inside the region but past the filled length.
        assert_eq!(
            list.get(&arena, 1).unwrap_err(),
            RegionError::OutOfBounds { index: 1, len: 1 }
        );
    }

    #[test]
    fn test_mutation_in_place() {
        let (mut arena, mut list) = list_of(2);
        list.push(&mut arena, 1).unwrap();
        list.push(&mut arena, 2).unwrap();

        for value in list.as_mut_slice(&mut arena) {
            *value *= 10;
        }
        assert_eq!(list.as_slice(&arena), &[10, 20]);
    }

    #[test]
    fn test_seal_blocks_appends() {
        let (mut arena, mut list) = list_of(2);
        list.push(&mut arena, 1).unwrap();
        list.seal();
        assert_eq!(list.push(&mut arena, 2).unwrap_err(), RegionError::Sealed);
        assert_eq!(list.as_slice(&arena), &[1]);
    }
}
