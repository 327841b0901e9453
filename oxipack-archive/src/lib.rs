//! # OxiPack Archive
//!
//! Chunked pack container support for OxiPack.
//!
//! A pack bundles named byte blobs into one file. Entries are grouped into
//! chunks of at most 255; each chunk is a directory page followed by the
//! data it describes, and chunks are chained through absolute
//! `next_chunk_offset` pointers. Every entry carries a CRC-32 of its data.
//!
//! - [`chunk`]: On-disk chunk and file header codec
//! - [`layout`]: Chunk partitioning and two-pass offset resolution
//! - [`builder`]: [`PackBuilder`] and the one-shot [`build`]
//! - [`reader`]: [`PackReader`], lazy chunk/entry iteration, verification
//! - [`config`]: [`PackConfig`]
//!
//! ## Example
//!
//! ```rust
//! use oxipack_archive::{PackReader, build};
//!
//! let bytes = build([
//!     ("readme.txt", b"hello".to_vec()),
//!     ("data.bin", vec![1, 2, 3]),
//! ])?;
//!
//! let reader = PackReader::new(bytes)?;
//! for entry in reader.entries() {
//!     let entry = entry?;
//!     println!("{} ({} bytes)", entry.name, entry.length);
//! }
//! assert_eq!(reader.read_by_name("data.bin")?, [1, 2, 3]);
//! # Ok::<(), oxipack_core::PackError>(())
//! ```
//!
//! ## Features
//!
//! - `parallel`: `PackReader::par_verify_all` using rayon
//! - `mmap`: `PackReader::open_mmap` over a memory-mapped file

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod builder;
pub mod chunk;
pub mod config;
pub mod layout;
pub mod reader;

// Re-exports
pub use builder::{PackBuilder, build};
pub use chunk::{CHUNK_CAPACITY, ChunkHeader, END_OF_CHAIN, FileHeader};
pub use config::PackConfig;
pub use layout::{ChunkLayout, EntrySize, PackLayout};
pub use reader::{ChunkInfo, Chunks, Entries, EntryStatus, PackIndex, PackReader, VerifyReport};
