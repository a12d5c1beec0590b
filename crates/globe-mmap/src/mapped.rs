//! Read-only and read-write file mappings.
//!
//! [`MappedFile`] exposes an existing file's bytes without copying them.
//! [`MappedBuffer`] is a writable mapping of fixed length: either a freshly
//! created file whose pages are written straight back to disk, or a private
//! copy-on-write view of an existing file whose edits never reach it.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapMut, MmapOptions};
use tracing::debug;

use crate::error::MapError;

/// Read-only view of a file's contents.
pub struct MappedFile {
    path: PathBuf,
    // Zero-length files are not mappable; they read as an empty slice.
    map: Option<Mmap>,
}

impl MappedFile {
    /// Map `path` read-only.
    pub fn open(path: &Path) -> Result<Self, MapError> {
        let file = File::open(path).map_err(|source| MapError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let len = file_len(&file, path)?;

        let map = if len == 0 {
            None
        } else {
            // SAFETY: the mapping lives as long as `self`; the file is not
            // expected to be truncated by another process while mapped.
            let map = unsafe { Mmap::map(&file) }.map_err(|source| MapError::Map {
                path: path.to_path_buf(),
                source,
            })?;
            Some(map)
        };

        debug!("Mapped {} read-only ({len} bytes)", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            map,
        })
    }

    /// Path the mapping was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Length of the mapped file in bytes.
    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    /// Returns `true` if the file is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The mapped bytes.
    pub fn bytes(&self) -> &[u8] {
        self.map.as_deref().unwrap_or_default()
    }
}

/// Writable mapping of a fixed number of bytes.
#[derive(Debug)]
pub struct MappedBuffer {
    path: PathBuf,
    map: Option<MmapMut>,
    private: bool,
}

impl MappedBuffer {
    /// Create (or truncate) `path`, size it to exactly `len` bytes, and map it
    /// read-write. Writes land in the file's pages.
    pub fn create(path: &Path, len: usize) -> Result<Self, MapError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|source| MapError::Create {
                path: path.to_path_buf(),
                source,
            })?;

        file.set_len(len as u64).map_err(|source| MapError::Resize {
            path: path.to_path_buf(),
            len: len as u64,
            source,
        })?;

        let map = if len == 0 {
            None
        } else {
            // SAFETY: the file was just created by us and is owned by this
            // mapping for its lifetime.
            let map = unsafe { MmapOptions::new().len(len).map_mut(&file) }.map_err(|source| {
                MapError::Map {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
            Some(map)
        };

        debug!("Mapped {} read-write ({len} bytes)", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            map,
            private: false,
        })
    }

    /// Map an existing file copy-on-write. The file is opened read-only; edits
    /// made through the mapping stay in memory.
    pub fn open_private(path: &Path) -> Result<Self, MapError> {
        let file = File::open(path).map_err(|source| MapError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let len = file_len(&file, path)?;

        let map = if len == 0 {
            None
        } else {
            // SAFETY: private mapping; the file is not expected to be
            // truncated by another process while mapped.
            let map = unsafe { MmapOptions::new().map_copy(&file) }.map_err(|source| {
                MapError::Map {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
            Some(map)
        };

        debug!("Mapped {} copy-on-write ({len} bytes)", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            map,
            private: true,
        })
    }

    /// Path the mapping was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` for copy-on-write mappings.
    pub fn is_private(&self) -> bool {
        self.private
    }

    /// Length of the mapping in bytes.
    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    /// Returns `true` if the mapping is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The mapped bytes.
    pub fn bytes(&self) -> &[u8] {
        self.map.as_deref().unwrap_or_default()
    }

    /// The mapped bytes, writable.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        self.map.as_deref_mut().unwrap_or_default()
    }
}

/// Shrink (or grow) the file at `path` to `len` bytes.
///
/// Must not be called while a [`MappedBuffer`] over the same file is alive.
pub fn truncate_file(path: &Path, len: u64) -> Result<(), MapError> {
    let file = OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|source| MapError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    file.set_len(len).map_err(|source| MapError::Resize {
        path: path.to_path_buf(),
        len,
        source,
    })
}

fn file_len(file: &File, path: &Path) -> Result<u64, MapError> {
    file.metadata()
        .map(|meta| meta.len())
        .map_err(|source| MapError::Open {
            path: path.to_path_buf(),
            source,
        })
}
