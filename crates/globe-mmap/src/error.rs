//! Mapping and region error types.

use std::path::PathBuf;

/// Errors raised while opening, creating, or mapping a file.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// The file could not be opened for reading.
    #[error("failed to open {}: {source}", path.display())]
    Open {
        /// File that was being opened.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The file could not be created or opened for writing.
    #[error("failed to create {}: {source}", path.display())]
    Create {
        /// File that was being created.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The file could not be resized to the requested length.
    #[error("failed to resize {} to {len} bytes: {source}", path.display())]
    Resize {
        /// File that was being resized.
        path: PathBuf,
        /// Requested length in bytes.
        len: u64,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The operating system refused to map the file.
    #[error("failed to map {}: {source}", path.display())]
    Map {
        /// File that was being mapped.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by arena sub-allocation and region lists.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegionError {
    /// The arena has fewer bytes left than the allocation needs.
    #[error("arena exhausted: requested {requested} bytes, {available} available")]
    OutOfSpace {
        /// Bytes requested.
        requested: usize,
        /// Bytes left between the cursor and the end of the arena.
        available: usize,
    },

    /// An append would run past the list's reserved capacity.
    #[error("region list full: capacity of {capacity} elements exceeded")]
    CapacityExceeded {
        /// Number of elements the region was reserved for.
        capacity: usize,
    },

    /// The list is bound to a fully-loaded region and does not accept appends.
    #[error("region list is sealed")]
    Sealed,

    /// A checked index was past the filled length.
    #[error("index {index} out of bounds for length {len}")]
    OutOfBounds {
        /// Requested index.
        index: usize,
        /// Filled length of the list.
        len: usize,
    },

    /// The allocation cursor is not aligned for the element type.
    #[error("offset {offset} is not aligned to {align} bytes")]
    Misaligned {
        /// Byte offset of the attempted view.
        offset: usize,
        /// Required alignment of the element type.
        align: usize,
    },
}
