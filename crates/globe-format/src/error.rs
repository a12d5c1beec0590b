//! Format validation errors.

use globe_mmap::RegionError;

use crate::header::ChunkType;

/// Errors raised while laying out, patching, or reading a mesh file.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// The file does not start with the expected identifier.
    #[error("bad file id 0x{found:04x}, expected 0x1234")]
    BadMagic {
        /// Identifier found in the file.
        found: u16,
    },

    /// The file was written by a newer format version.
    #[error("format version 0x{found:04x} is newer than supported 0x{supported:04x}")]
    VersionTooNew {
        /// Version found in the file.
        found: u32,
        /// Newest version this build reads.
        supported: u32,
    },

    /// A header declares itself smaller than its fixed fields.
    #[error("header at offset {offset} declares {declared} bytes, minimum is {minimum}")]
    HeaderTooShort {
        /// Byte offset of the header.
        offset: usize,
        /// Size the header declares.
        declared: u16,
        /// Size of the fixed header fields.
        minimum: usize,
    },

    /// The file ends before a header or payload does.
    #[error("file truncated at offset {offset}: need {needed} bytes, {available} available")]
    Truncated {
        /// Byte offset of the incomplete item.
        offset: usize,
        /// Bytes the item needs.
        needed: usize,
        /// Bytes left in the file.
        available: usize,
    },

    /// A chunk header carries a different type than the fixed order requires.
    #[error("chunk at offset {offset}: expected {expected:?}, found type {found}")]
    UnexpectedChunk {
        /// Byte offset of the chunk header.
        offset: usize,
        /// Chunk type required at this position.
        expected: ChunkType,
        /// Raw type tag found.
        found: u16,
    },

    /// A chunk's element stride differs from the element type's size.
    #[error("{kind:?} chunk: stride {found} does not match element size {expected}")]
    StrideMismatch {
        /// Chunk being validated.
        kind: ChunkType,
        /// Size of the element type.
        expected: usize,
        /// Stride declared in the header.
        found: u32,
    },

    /// A chunk header's byte size disagrees with its count and stride.
    #[error("{kind:?} chunk: {count} x {stride} bytes does not equal declared size {size}")]
    InconsistentSize {
        /// Chunk being validated.
        kind: ChunkType,
        /// Declared element count.
        count: u64,
        /// Declared element stride.
        stride: u32,
        /// Declared payload size.
        size: u64,
    },

    /// Patching would declare more bytes than were allocated for the chunk.
    #[error("{kind:?} chunk: {used} bytes used but only {allocated} allocated")]
    PatchOverflow {
        /// Chunk being patched.
        kind: ChunkType,
        /// Bytes the actual element count needs.
        used: usize,
        /// Bytes reserved at allocation time.
        allocated: usize,
    },

    /// After patching, a chunk no longer starts where its predecessor ends.
    #[error("{kind:?} chunk header at offset {found}, previous chunk ends at {expected}")]
    ChunkGap {
        /// Chunk being patched.
        kind: ChunkType,
        /// Offset where the previous payload ends.
        expected: usize,
        /// Offset of this chunk's header.
        found: usize,
    },

    /// Arena allocation or access failed.
    #[error(transparent)]
    Region(#[from] RegionError),
}
