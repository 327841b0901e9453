//! Memory-mapped pack files.
//!
//! [`MappedPack`] maps a pack read-only and serves positioned reads straight
//! from the mapping, so directory scans and entry fetches never copy through
//! an intermediate buffer. The mapping lives behind an [`Arc`]; clones are
//! cheap and may be handed to other threads.
//!
//! # Safety
//!
//! A mapping observes later writes to the file. Packs are never modified in
//! place, but another process replacing the file's contents while it is
//! mapped would be visible to readers.
//!
//! # Example
//!
//! ```no_run
//! use oxipack_core::mmap::MappedPack;
//! use oxipack_core::PackSource;
//!
//! let pack = MappedPack::open("assets_0.pack")?;
//! let mut prefix = [0u8; 8];
//! pack.read_exact_at(&mut prefix, 0)?;
//! # Ok::<(), oxipack_core::PackError>(())
//! ```

use crate::error::Result;
use crate::source::PackSource;
use memmap2::Mmap;
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// A read-only memory-mapped pack file.
#[derive(Debug, Clone)]
pub struct MappedPack {
    mmap: Arc<Mmap>,
}

impl MappedPack {
    /// Open and map the file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_file(&file)
    }

    /// Map an already-open file.
    pub fn from_file(file: &File) -> Result<Self> {
        // SAFETY: read-only mapping; packs are rewritten by rename, never in place.
        let mmap = unsafe { Mmap::map(file)? };
        Ok(Self {
            mmap: Arc::new(mmap),
        })
    }

    /// The mapped bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.mmap
    }
}

impl PackSource for MappedPack {
    fn len(&self) -> io::Result<u64> {
        Ok(self.mmap.len() as u64)
    }

    fn read_exact_at(&self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        PackSource::read_exact_at(self.as_slice(), buf, offset)
    }
}

impl AsRef<[u8]> for MappedPack {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}
