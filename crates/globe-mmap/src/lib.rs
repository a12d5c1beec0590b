//! Memory-mapped files and typed sub-allocation over byte buffers.
//!
//! A [`ByteArena`] owns a contiguous byte image (heap memory or a mapped file)
//! and hands out [`Region`]s front to back. A [`RegionList`] is an append-only
//! list whose elements live directly inside one of those regions, so whatever
//! is pushed is already in its final on-disk position.

mod arena;
mod error;
mod mapped;
mod region_list;

pub use arena::{ByteArena, Region};
pub use error::{MapError, RegionError};
pub use mapped::{MappedBuffer, MappedFile, truncate_file};
pub use region_list::RegionList;
