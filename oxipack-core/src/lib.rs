//! # OxiPack Core
//!
//! Core components for the OxiPack archive library.
//!
//! This crate provides the building blocks shared by the pack builder, the
//! pack reader and the command-line tool:
//!
//! - [`crc`]: Table-driven CRC-32 checksum engine
//! - [`entry`]: Entry metadata and name validation
//! - [`source`]: Positioned-read storage abstraction
//! - [`error`]: Error types
//! - `mmap`: Memory-mapped pack files (feature `mmap`)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L4: Collaborator                                        │
//! │     oxipack CLI (name policy, persistence)              │
//! ├─────────────────────────────────────────────────────────┤
//! │ L3: Container                                           │
//! │     Chunk codec, PackBuilder, PackReader                │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Core (this crate)                                   │
//! │     CRC-32, Entry, PackSource, PackError                │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxipack_core::crc::Crc32;
//! use oxipack_core::PackSource;
//!
//! let crc = Crc32::compute(b"123456789");
//! assert_eq!(crc, 0xCBF43926);
//!
//! let bytes: &[u8] = b"chunk";
//! let mut buf = [0u8; 3];
//! bytes.read_exact_at(&mut buf, 2).unwrap();
//! assert_eq!(&buf, b"unk");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod crc;
pub mod entry;
pub mod error;
#[cfg(feature = "mmap")]
pub mod mmap;
pub mod source;

// Re-exports for convenience
pub use crc::{Crc32, Crc32Table};
pub use entry::{Entry, MAX_NAME_LEN, validate_name};
pub use error::{ErrorKind, PackError, Result};
#[cfg(feature = "mmap")]
pub use mmap::MappedPack;
pub use source::PackSource;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::crc::Crc32;
    pub use crate::entry::Entry;
    pub use crate::error::{PackError, Result};
    pub use crate::source::PackSource;
}
