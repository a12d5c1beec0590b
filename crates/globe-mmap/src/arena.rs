//! Bump allocation of typed regions over a contiguous byte image.

use std::mem::{align_of, size_of};
use std::ops::Range;

use bytemuck::Pod;

use crate::error::RegionError;
use crate::mapped::MappedBuffer;

/// Largest element alignment an arena can serve. Heap images are backed by
/// `u64` words and mappings start on a page boundary, so offsets that are
/// multiples of the element alignment stay aligned in memory.
const MAX_ALIGN: usize = align_of::<u64>();

/// A contiguous span of an arena reserved for `capacity` elements of `stride` bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    /// Byte offset from the start of the arena.
    pub offset: usize,
    /// Number of elements the region can hold.
    pub capacity: usize,
    /// Size of one element in bytes.
    pub stride: usize,
}

impl Region {
    /// Total bytes reserved by the region.
    pub fn byte_len(&self) -> usize {
        self.capacity * self.stride
    }

    /// Byte offset one past the end of the region.
    pub fn end(&self) -> usize {
        self.offset + self.byte_len()
    }

    /// Byte range covered by the first `count` elements.
    pub fn byte_range(&self, count: usize) -> Range<usize> {
        self.offset..self.offset + count * self.stride
    }
}

#[derive(Debug)]
enum Storage {
    Heap(Vec<u64>),
    Mapped(MappedBuffer),
}

/// Owns a byte image and hands out [`Region`]s from front to back.
///
/// The image is either heap memory or a writable file mapping; in both cases
/// what is written through a region is the final byte layout, with no later
/// serialization step.
#[derive(Debug)]
pub struct ByteArena {
    storage: Storage,
    len: usize,
    cursor: usize,
}

impl ByteArena {
    /// A zeroed heap image of `len` bytes.
    pub fn heap(len: usize) -> Self {
        Self {
            storage: Storage::Heap(vec![0u64; len.div_ceil(8)]),
            len,
            cursor: 0,
        }
    }

    /// An image backed by a writable file mapping.
    pub fn mapped(buffer: MappedBuffer) -> Self {
        let len = buffer.len();
        Self {
            storage: Storage::Mapped(buffer),
            len,
            cursor: 0,
        }
    }

    /// Returns the backing mapping, if any.
    pub fn mapping(&self) -> Option<&MappedBuffer> {
        match &self.storage {
            Storage::Heap(_) => None,
            Storage::Mapped(buffer) => Some(buffer),
        }
    }

    /// Total size of the image in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the image has no bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Offset at which the next region will start.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Bytes between the cursor and the end of the image.
    pub fn remaining(&self) -> usize {
        self.len - self.cursor
    }

    /// The whole image.
    pub fn bytes(&self) -> &[u8] {
        match &self.storage {
            Storage::Heap(words) => &bytemuck::cast_slice::<u64, u8>(words)[..self.len],
            Storage::Mapped(buffer) => buffer.bytes(),
        }
    }

    /// The whole image, writable.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        match &mut self.storage {
            Storage::Heap(words) => &mut bytemuck::cast_slice_mut::<u64, u8>(words)[..self.len],
            Storage::Mapped(buffer) => buffer.bytes_mut(),
        }
    }

    /// Reserve room for `count` elements of `T` at the cursor.
    ///
    /// Fails if the cursor is not aligned for `T` or the image is too small.
    pub fn allocate<T: Pod>(&mut self, count: usize) -> Result<Region, RegionError> {
        let align = align_of::<T>();
        if align > MAX_ALIGN || self.cursor % align != 0 {
            return Err(RegionError::Misaligned {
                offset: self.cursor,
                align,
            });
        }
        self.claim(size_of::<T>(), count)
    }

    /// Reserve `len` raw bytes at the cursor, with no alignment requirement.
    pub fn allocate_bytes(&mut self, len: usize) -> Result<Region, RegionError> {
        self.claim(1, len)
    }

    fn claim(&mut self, stride: usize, count: usize) -> Result<Region, RegionError> {
        let available = self.remaining();
        let requested = stride.checked_mul(count).unwrap_or(usize::MAX);
        if requested > available {
            return Err(RegionError::OutOfSpace {
                requested,
                available,
            });
        }

        let region = Region {
            offset: self.cursor,
            capacity: count,
            stride,
        };
        self.cursor += requested;
        Ok(region)
    }

    /// Read a `T` at `offset` without alignment requirements.
    pub fn read<T: Pod>(&self, offset: usize) -> Result<T, RegionError> {
        let bytes = self.span(offset, size_of::<T>())?;
        Ok(bytemuck::pod_read_unaligned(bytes))
    }

    /// Write `value` at `offset` without alignment requirements.
    pub fn write<T: Pod>(&mut self, offset: usize, value: &T) -> Result<(), RegionError> {
        let len = size_of::<T>();
        self.span(offset, len)?;
        self.bytes_mut()[offset..offset + len].copy_from_slice(bytemuck::bytes_of(value));
        Ok(())
    }

    fn span(&self, offset: usize, len: usize) -> Result<&[u8], RegionError> {
        let available = self.len.saturating_sub(offset);
        if len > available {
            return Err(RegionError::OutOfSpace {
                requested: len,
                available,
            });
        }
        Ok(&self.bytes()[offset..offset + len])
    }

    /// Typed view of the first `count` elements of `region`.
    ///
    /// # Panics
    ///
    /// Panics if `region` was not allocated from this arena for `T`.
    pub(crate) fn typed<T: Pod>(&self, region: &Region, count: usize) -> &[T] {
        debug_assert_eq!(region.stride, size_of::<T>());
        debug_assert!(count <= region.capacity);
        bytemuck::cast_slice(&self.bytes()[region.byte_range(count)])
    }

    /// Writable typed view of the first `count` elements of `region`.
    ///
    /// # Panics
    ///
    /// Panics if `region` was not allocated from this arena for `T`.
    pub(crate) fn typed_mut<T: Pod>(&mut self, region: &Region, count: usize) -> &mut [T] {
        debug_assert_eq!(region.stride, size_of::<T>());
        debug_assert!(count <= region.capacity);
        bytemuck::cast_slice_mut(&mut self.bytes_mut()[region.byte_range(count)])
    }
}
