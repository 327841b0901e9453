//! Error types for OxiPack operations.
//!
//! Build-time problems with the caller's input surface as
//! [`PackError::InvalidEntry`]; a malformed or truncated pack surfaces as
//! [`PackError::Format`]; a checksum mismatch on a verified read surfaces as
//! [`PackError::Integrity`].

use std::io;
use thiserror::Error;

/// Broad classification of a [`PackError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Underlying I/O failure.
    Io,
    /// Malformed chunk chain, truncated stream or bounds violation.
    Format,
    /// Stored checksum does not match the data.
    Integrity,
    /// Entry rejected while building.
    InvalidEntry,
    /// No entry with the requested name.
    NotFound,
}

/// The main error type for OxiPack operations.
#[derive(Debug, Error)]
pub enum PackError {
    /// I/O error from underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed pack structure.
    #[error("Format error at offset {offset}: {message}")]
    Format {
        /// Byte offset where the problem was detected.
        offset: u64,
        /// Description of the problem.
        message: String,
    },

    /// CRC-32 of fetched data differs from the stored checksum.
    #[error("Integrity error in '{name}': stored CRC {expected:#010x}, computed {computed:#010x}")]
    Integrity {
        /// Name of the corrupt entry.
        name: String,
        /// Checksum recorded in the file header.
        expected: u32,
        /// Checksum of the bytes actually read.
        computed: u32,
    },

    /// Entry rejected at build time.
    #[error("Invalid entry '{name}': {reason}")]
    InvalidEntry {
        /// Entry name (lossy rendering for non-ASCII input).
        name: String,
        /// Why the entry was rejected.
        reason: String,
    },

    /// The archive would not fit in 32-bit offsets.
    #[error("Archive too large: {size} bytes exceeds the 32-bit offset range")]
    TooLarge {
        /// Size the archive would have had.
        size: u64,
    },

    /// Entry not found in archive.
    #[error("Entry not found: {name}")]
    EntryNotFound {
        /// Name of the missing entry.
        name: String,
    },
}

/// Result type alias for OxiPack operations.
pub type Result<T> = std::result::Result<T, PackError>;

impl PackError {
    /// Create a format error.
    pub fn format(offset: u64, message: impl Into<String>) -> Self {
        Self::Format {
            offset,
            message: message.into(),
        }
    }

    /// Create a format error for a read that runs past the end of the stream.
    pub fn truncated(offset: u64, needed: u64, stream_len: u64) -> Self {
        Self::format(
            offset,
            format!(
                "need {} bytes but stream ends at {}",
                needed, stream_len
            ),
        )
    }

    /// Create an integrity error.
    pub fn integrity(name: impl Into<String>, expected: u32, computed: u32) -> Self {
        Self::Integrity {
            name: name.into(),
            expected,
            computed,
        }
    }

    /// Create an invalid entry error.
    pub fn invalid_entry(name: impl AsRef<[u8]>, reason: impl Into<String>) -> Self {
        Self::InvalidEntry {
            name: String::from_utf8_lossy(name.as_ref()).into_owned(),
            reason: reason.into(),
        }
    }

    /// Create a too-large error.
    pub fn too_large(size: u64) -> Self {
        Self::TooLarge { size }
    }

    /// Create an entry not found error.
    pub fn entry_not_found(name: impl Into<String>) -> Self {
        Self::EntryNotFound { name: name.into() }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::Format { .. } | Self::TooLarge { .. } => ErrorKind::Format,
            Self::Integrity { .. } => ErrorKind::Integrity,
            Self::InvalidEntry { .. } => ErrorKind::InvalidEntry,
            Self::EntryNotFound { .. } => ErrorKind::NotFound,
        }
    }
}
