//! Validating walk over a mesh file image.

use std::mem::size_of;

use bytemuck::Pod;
use globe_mmap::{ByteArena, RegionError};

use crate::error::FormatError;
use crate::header::{
    CHUNK_HEADER_BYTES, ChunkHeader, ChunkType, FILE_HEADER_BYTES, FORMAT_VERSION, FileHeader,
    ID_WORD,
};
use crate::writer::ChunkRecord;

/// Read and validate the file header at the arena cursor, leaving the cursor
/// at the first chunk.
pub fn read_file_header(arena: &mut ByteArena) -> Result<FileHeader, FormatError> {
    let offset = arena.cursor();
    let header: FileHeader = arena
        .read(offset)
        .map_err(|e| truncated(offset, e))?;

    if header.id_word != ID_WORD {
        return Err(FormatError::BadMagic {
            found: header.id_word,
        });
    }
    if header.version_id > FORMAT_VERSION {
        return Err(FormatError::VersionTooNew {
            found: header.version_id,
            supported: FORMAT_VERSION,
        });
    }

    skip_header(arena, offset, header.header_bytes, FILE_HEADER_BYTES)?;
    Ok(header)
}

/// Read the next chunk, which must be of type `expected` and hold elements of
/// `T`, leaving the cursor just past its payload.
///
/// The returned payload region holds exactly the declared element count.
pub fn read_chunk<T: Pod>(
    arena: &mut ByteArena,
    expected: ChunkType,
) -> Result<ChunkRecord, FormatError> {
    let offset = arena.cursor();
    let header: ChunkHeader = arena
        .read(offset)
        .map_err(|e| truncated(offset, e))?;

    if header.chunk_type != expected as u16 {
        return Err(FormatError::UnexpectedChunk {
            offset,
            expected,
            found: header.chunk_type,
        });
    }

    let stride = size_of::<T>();
    if header.data_stride as usize != stride {
        return Err(FormatError::StrideMismatch {
            kind: expected,
            expected: stride,
            found: header.data_stride,
        });
    }

    let inconsistent = || FormatError::InconsistentSize {
        kind: expected,
        count: header.data_count,
        stride: header.data_stride,
        size: header.data_size,
    };
    let count = usize::try_from(header.data_count).map_err(|_| inconsistent())?;
    if header
        .data_count
        .checked_mul(u64::from(header.data_stride))
        .is_none_or(|size| size != header.data_size)
    {
        return Err(inconsistent());
    }

    skip_header(arena, offset, header.header_bytes, CHUNK_HEADER_BYTES)?;
    let payload_offset = arena.cursor();
    let payload = arena
        .allocate::<T>(count)
        .map_err(|e| truncated(payload_offset, e))?;

    Ok(ChunkRecord {
        kind: expected,
        header_offset: offset,
        payload,
    })
}

/// Read the end-of-file marker that must follow the last chunk.
pub fn read_eof(arena: &mut ByteArena) -> Result<(), FormatError> {
    let offset = arena.cursor();
    let header: ChunkHeader = arena
        .read(offset)
        .map_err(|e| truncated(offset, e))?;

    if header.chunk_type != ChunkType::Eof as u16 {
        return Err(FormatError::UnexpectedChunk {
            offset,
            expected: ChunkType::Eof,
            found: header.chunk_type,
        });
    }
    skip_header(arena, offset, header.header_bytes, CHUNK_HEADER_BYTES)
}

/// Advance past a header of `declared` bytes whose fixed fields span `minimum`.
fn skip_header(
    arena: &mut ByteArena,
    offset: usize,
    declared: u16,
    minimum: usize,
) -> Result<(), FormatError> {
    if (declared as usize) < minimum {
        return Err(FormatError::HeaderTooShort {
            offset,
            declared,
            minimum,
        });
    }
    arena
        .allocate_bytes(declared as usize)
        .map_err(|e| truncated(offset, e))?;
    Ok(())
}

fn truncated(offset: usize, err: RegionError) -> FormatError {
    match err {
        RegionError::OutOfSpace {
            requested,
            available,
        } => FormatError::Truncated {
            offset,
            needed: requested,
            available,
        },
        other => FormatError::Region(other),
    }
}
