//! Chunk allocation and the size-patching pass.

use std::mem::size_of;

use bytemuck::Pod;
use globe_mmap::{ByteArena, Region};
use tracing::{debug, info};

use crate::error::FormatError;
use crate::header::{
    CHUNK_HEADER_BYTES, ChunkHeader, ChunkType, FILE_HEADER_BYTES, FileHeader, data_bytes_for,
};

/// Where a chunk was laid out in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkRecord {
    /// Chunk type written in the header.
    pub kind: ChunkType,
    /// Byte offset of the chunk header.
    pub header_offset: usize,
    /// Payload region following the header.
    pub payload: Region,
}

/// Write the file header at the arena cursor, which must be at offset 0.
pub fn write_file_header(arena: &mut ByteArena) -> Result<Region, FormatError> {
    let region = arena.allocate_bytes(FILE_HEADER_BYTES)?;
    let header = FileHeader::new(arena.len());
    arena.write(region.offset, &header)?;
    Ok(region)
}

/// Lay out a chunk header followed by room for `count` elements of `T`.
///
/// The header declares `count` elements; [`finish_chunks`] later replaces
/// that with the number actually written.
pub fn allocate_chunk<T: Pod>(
    arena: &mut ByteArena,
    kind: ChunkType,
    count: usize,
) -> Result<ChunkRecord, FormatError> {
    let header = arena.allocate_bytes(CHUNK_HEADER_BYTES)?;
    let payload = arena.allocate::<T>(count)?;
    arena.write(header.offset, &ChunkHeader::new(kind, size_of::<T>(), count))?;

    debug!(
        "Allocated {kind:?} chunk at offset {}: {count} x {} bytes",
        header.offset,
        size_of::<T>()
    );
    Ok(ChunkRecord {
        kind,
        header_offset: header.offset,
        payload,
    })
}

/// Patch each chunk header with the element count actually produced, then
/// write the end-of-file marker right after the last payload.
///
/// `chunks` pairs every record, in file order, with its final element count.
/// Returns the byte offset just past the end-of-file marker: everything after
/// it is unused slack and the file may be truncated there.
///
/// Stops at the first chunk that fails validation. Headers patched before
/// that point keep their new values.
pub fn finish_chunks(
    arena: &mut ByteArena,
    chunks: &[(ChunkRecord, usize)],
) -> Result<usize, FormatError> {
    let mut expected_offset = chunks.first().map_or(FILE_HEADER_BYTES, |(r, _)| r.header_offset);

    for &(record, actual) in chunks {
        let offset = record.header_offset;
        if offset != expected_offset {
            return Err(FormatError::ChunkGap {
                kind: record.kind,
                expected: expected_offset,
                found: offset,
            });
        }

        let mut header: ChunkHeader = arena.read(offset)?;
        if header.kind() != Some(record.kind) {
            return Err(FormatError::UnexpectedChunk {
                offset,
                expected: record.kind,
                found: header.chunk_type,
            });
        }
        if header.data_stride as usize != record.payload.stride {
            return Err(FormatError::StrideMismatch {
                kind: record.kind,
                expected: record.payload.stride,
                found: header.data_stride,
            });
        }

        let used = actual * record.payload.stride;
        let allocated = record.payload.byte_len();
        if used > allocated {
            return Err(FormatError::PatchOverflow {
                kind: record.kind,
                used,
                allocated,
            });
        }

        header.data_count = actual as u64;
        header.data_size = used as u64;
        arena.write(offset, &header)?;
        debug!(
            "Patched {:?} chunk: {actual} of {} elements used",
            record.kind, record.payload.capacity
        );

        expected_offset = offset + CHUNK_HEADER_BYTES + used;
    }

    arena.write(expected_offset, &ChunkHeader::eof())?;
    let end = expected_offset + CHUNK_HEADER_BYTES;

    let mut file_header: FileHeader = arena.read(0)?;
    file_header.data_bytes = data_bytes_for(end);
    arena.write(0, &file_header)?;

    info!(
        "Chunk sizes patched; {end} of {} bytes in use",
        arena.len()
    );
    Ok(end)
}
