//! Pack entry metadata.
//!
//! An [`Entry`] is the reader-side view of one file header: the entry's name
//! plus where its bytes live in the pack and the checksum they must match.
//! Names are ASCII on disk; [`validate_name`] enforces the rules the builder
//! applies before anything is written.

use crate::crc::Crc32;
use crate::error::{PackError, Result};
use std::ops::Range;

/// Default upper bound on entry name length in bytes.
pub const MAX_NAME_LEN: usize = u16::MAX as usize;

/// Check that `name` can be stored as an entry name.
///
/// A name must be non-empty, at most `max_len` bytes, and ASCII without NUL
/// bytes.
pub fn validate_name(name: &[u8], max_len: usize) -> Result<()> {
    if name.is_empty() {
        return Err(PackError::invalid_entry(name, "name is empty"));
    }
    if name.len() > max_len {
        return Err(PackError::invalid_entry(
            &name[..32.min(name.len())],
            format!("name is {} bytes, limit is {}", name.len(), max_len),
        ));
    }
    if let Some(pos) = name.iter().position(|&b| !b.is_ascii() || b == 0) {
        return Err(PackError::invalid_entry(
            name,
            format!("byte {:#04x} at position {} is not a valid name character", name[pos], pos),
        ));
    }
    Ok(())
}

/// An entry in a pack.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    /// Entry name.
    pub name: String,
    /// Absolute offset of the entry's data in the pack.
    pub offset: u32,
    /// Length of the entry's data in bytes.
    pub length: u32,
    /// CRC-32 of the entry's data.
    pub checksum: u32,
    /// Zero-based position of the owning chunk in the chain.
    pub chunk: usize,
}

impl Entry {
    /// Byte range of the entry's data within the pack.
    pub fn data_range(&self) -> Range<u64> {
        let start = u64::from(self.offset);
        start..start + u64::from(self.length)
    }

    /// Check `data` against the stored checksum.
    pub fn verify(&self, data: &[u8]) -> Result<()> {
        let computed = Crc32::compute(data);
        if computed != self.checksum {
            return Err(PackError::integrity(&self.name, self.checksum, computed));
        }
        Ok(())
    }

    /// Get a relative path that's safe to join onto an extraction directory.
    ///
    /// Both `/` and `\` separate components; empty, `.` and `..` components
    /// are dropped.
    pub fn sanitized_name(&self) -> String {
        self.name
            .split(['/', '\\'])
            .filter(|c| !c.is_empty() && *c != "." && *c != "..")
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl std::fmt::Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:>10} {:>10} {:08x} {}",
            self.offset, self.length, self.checksum, self.name
        )
    }
}
