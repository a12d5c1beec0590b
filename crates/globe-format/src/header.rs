//! On-disk file and chunk headers.

/// Identifier stored in the first two bytes of every mesh file.
pub const ID_WORD: u16 = 0x1234;

/// Newest format version this build reads and the version it writes.
pub const FORMAT_VERSION: u32 = 0x0100;

/// Size of [`FileHeader`] in bytes.
pub const FILE_HEADER_BYTES: usize = 16;

/// Size of [`ChunkHeader`] in bytes.
pub const CHUNK_HEADER_BYTES: usize = 24;

/// Type tag of a chunk.
#[repr(u16)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChunkType {
    /// Subdivision level ranges.
    SubdivInfo = 1,
    /// Triangles.
    Faces = 2,
    /// Vertices.
    Verts = 3,
    /// Per-vertex elevations.
    Elevs = 4,
    /// Zero-length end-of-file marker.
    Eof = 0xFFFF,
}

impl ChunkType {
    /// Decode a raw chunk tag.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(Self::SubdivInfo),
            2 => Some(Self::Faces),
            3 => Some(Self::Verts),
            4 => Some(Self::Elevs),
            0xFFFF => Some(Self::Eof),
            _ => None,
        }
    }
}

/// Fixed header at the start of a mesh file.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FileHeader {
    /// Must equal [`ID_WORD`].
    pub id_word: u16,
    /// Size of this header in bytes.
    pub header_bytes: u16,
    /// Format version, at most [`FORMAT_VERSION`].
    pub version_id: u32,
    /// Bytes following this header, saturated to `u32::MAX`.
    pub data_bytes: u32,
    /// Reserved, zero.
    pub padding: u32,
}

static_assertions::assert_eq_size!(FileHeader, [u8; FILE_HEADER_BYTES]);

impl FileHeader {
    /// Header for a file of `file_len` bytes in the current version.
    pub fn new(file_len: usize) -> Self {
        Self {
            id_word: ID_WORD,
            header_bytes: FILE_HEADER_BYTES as u16,
            version_id: FORMAT_VERSION,
            data_bytes: data_bytes_for(file_len),
            padding: 0,
        }
    }
}

pub(crate) fn data_bytes_for(file_len: usize) -> u32 {
    u32::try_from(file_len.saturating_sub(FILE_HEADER_BYTES)).unwrap_or(u32::MAX)
}

/// Header preceding each chunk payload.
///
/// The struct is 8-byte aligned in memory but chunk headers are not
/// guaranteed to be 8-byte aligned in the file, so they are always copied in
/// and out rather than viewed in place.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ChunkHeader {
    /// Raw [`ChunkType`] tag.
    pub chunk_type: u16,
    /// Size of this header in bytes.
    pub header_bytes: u16,
    /// Size of one payload element in bytes.
    pub data_stride: u32,
    /// Number of payload elements.
    pub data_count: u64,
    /// Payload size in bytes, `data_count * data_stride`.
    pub data_size: u64,
}

static_assertions::assert_eq_size!(ChunkHeader, [u8; CHUNK_HEADER_BYTES]);

impl ChunkHeader {
    /// Header declaring `count` elements of `stride` bytes.
    pub fn new(kind: ChunkType, stride: usize, count: usize) -> Self {
        Self {
            chunk_type: kind as u16,
            header_bytes: CHUNK_HEADER_BYTES as u16,
            data_stride: stride as u32,
            data_count: count as u64,
            data_size: (count * stride) as u64,
        }
    }

    /// The zero-length end-of-file marker.
    pub fn eof() -> Self {
        Self::new(ChunkType::Eof, 0, 0)
    }

    /// Decoded chunk type, if the tag is known.
    pub fn kind(&self) -> Option<ChunkType> {
        ChunkType::from_u16(self.chunk_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_header_bytes() {
        let header = FileHeader::new(116);
        let bytes = bytemuck::bytes_of(&header);
        assert_eq!(&bytes[0..2], &[0x34, 0x12]);
        assert_eq!(&bytes[2..4], &[16, 0]);
        assert_eq!(&bytes[4..8], &[0x00, 0x01, 0, 0]);
        assert_eq!(header.data_bytes, 100);
    }

    #[test]
    fn test_data_bytes_saturates() {
        assert_eq!(data_bytes_for(8), 0);
        assert_eq!(data_bytes_for(usize::MAX), u32::MAX);
    }

    #[test]
    fn test_chunk_header_size_matches_count() {
        let header = ChunkHeader::new(ChunkType::Faces, 12, 420);
        assert_eq!(header.chunk_type, 2);
        assert_eq!(header.header_bytes, 24);
        assert_eq!(header.data_size, 420 * 12);
        assert_eq!(header.kind(), Some(ChunkType::Faces));
    }

    #[test]
    fn test_eof_marker_is_empty() {
        let eof = ChunkHeader::eof();
        assert_eq!(eof.chunk_type, 0xFFFF);
        assert_eq!(eof.data_count, 0);
        assert_eq!(eof.data_size, 0);
    }

    #[test]
    fn test_unknown_chunk_tag() {
        assert_eq!(ChunkType::from_u16(0), None);
        assert_eq!(ChunkType::from_u16(5), None);
        assert_eq!(ChunkType::from_u16(3), Some(ChunkType::Verts));
    }
}
