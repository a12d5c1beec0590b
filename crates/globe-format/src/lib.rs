//! The chunked globe mesh file format.
//!
//! ## Binary Layout
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 16 | [`FileHeader`] (`id_word = 0x1234`, version `<= 0x0100`) |
//! | 16 | 24 | [`ChunkHeader`] for `SubdivInfo` |
//! | 40 | 24 × L | Subdivision levels |
//! | … | 24 | [`ChunkHeader`] for `Faces` |
//! | … | 12 × F | Triangles |
//! | … | 24 | [`ChunkHeader`] for `Verts` |
//! | … | 24 × V | Vertices |
//! | … | 24 | [`ChunkHeader`] for `Eof` (zero-length) |
//!
//! All integers are little-endian. Each payload immediately follows its
//! header and the next header immediately follows the payload.
//!
//! Writing is two-pass: chunks are allocated with generous element counts,
//! filled in place, then [`finish_chunks`] patches the exact counts and writes
//! the end-of-file marker.

mod error;
mod header;
mod reader;
mod writer;

pub use error::FormatError;
pub use header::{
    CHUNK_HEADER_BYTES, ChunkHeader, ChunkType, FILE_HEADER_BYTES, FORMAT_VERSION, FileHeader,
    ID_WORD,
};
pub use reader::{read_chunk, read_eof, read_file_header};
pub use writer::{ChunkRecord, allocate_chunk, finish_chunks, write_file_header};
