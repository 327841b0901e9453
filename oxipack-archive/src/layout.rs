//! Chunk partitioning and offset resolution.
//!
//! Offsets can only be assigned once every directory page is sized, because
//! the base of chunk `i` depends on the header and data sizes of all chunks
//! before it. [`PackLayout::resolve`] does both passes over per-entry sizes
//! alone, so the builder can lay out file-backed entries without holding
//! their data.

use crate::chunk::{CHUNK_CAPACITY, CHUNK_PREFIX_LEN, END_OF_CHAIN, FILE_HEADER_FIXED_LEN};
use oxipack_core::{PackError, Result};
use std::ops::Range;
use tracing::debug;

/// Sizes of one entry, all that offset resolution needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntrySize {
    /// Length of the entry name in bytes.
    pub name_len: usize,
    /// Length of the entry data in bytes.
    pub data_len: u64,
}

impl EntrySize {
    /// Create an entry size record.
    pub fn new(name_len: usize, data_len: u64) -> Self {
        Self { name_len, data_len }
    }

    fn header_len(&self) -> u64 {
        (FILE_HEADER_FIXED_LEN + self.name_len) as u64
    }
}

/// Resolved placement of one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkLayout {
    /// Absolute offset of the chunk's directory page.
    pub base: u64,
    /// Serialized size of the directory page.
    pub header_len: u64,
    /// Total length of the chunk's entry data.
    pub data_len: u64,
    /// Value written as `next_chunk_offset`.
    pub next_chunk_offset: u32,
    /// Indices of the entries stored in this chunk.
    pub entries: Range<usize>,
}

impl ChunkLayout {
    /// Bytes occupied by the directory page plus data.
    pub fn span(&self) -> u64 {
        self.header_len + self.data_len
    }

    /// Absolute offset just past this chunk.
    pub fn end(&self) -> u64 {
        self.base + self.span()
    }

    /// Number of entries in this chunk.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Whether this is the final chunk of the chain.
    pub fn is_last(&self) -> bool {
        self.next_chunk_offset == END_OF_CHAIN
    }
}

/// Resolved placement of a whole pack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackLayout {
    chunks: Vec<ChunkLayout>,
    offsets: Vec<u32>,
    total_len: u64,
}

impl PackLayout {
    /// Partition `sizes` into chunks and assign every absolute offset.
    ///
    /// Chunks hold [`CHUNK_CAPACITY`] entries except the last; an empty input
    /// still yields one empty terminal chunk. Fails with
    /// [`PackError::TooLarge`] if any offset would not fit in 32 bits.
    pub fn resolve(sizes: &[EntrySize]) -> Result<Self> {
        let chunk_count = sizes.len().div_ceil(CHUNK_CAPACITY).max(1);
        let mut chunks = Vec::with_capacity(chunk_count);
        let mut offsets = Vec::with_capacity(sizes.len());

        // Pass one: directory page sizes. Every field except the name is a
        // fixed four bytes whatever its value, so summing name lengths gives
        // the serialized size without encoding a placeholder header first.
        // The builder asserts this against `ChunkHeader::encode` in debug
        // builds.
        let mut header_lens = Vec::with_capacity(chunk_count);
        for index in 0..chunk_count {
            let range = chunk_range(index, sizes.len());
            let header_len = CHUNK_PREFIX_LEN as u64
                + sizes[range].iter().map(EntrySize::header_len).sum::<u64>();
            header_lens.push(header_len);
        }

        // Pass two: bases and data offsets, in file order.
        let mut base = 0u64;
        for (index, header_len) in header_lens.into_iter().enumerate() {
            let range = chunk_range(index, sizes.len());
            let mut cursor = base + header_len;
            for size in &sizes[range.clone()] {
                offsets.push(to_offset(cursor)?);
                cursor += size.data_len;
            }
            let data_len = cursor - base - header_len;
            let is_last = index + 1 == chunk_count;
            let next_chunk_offset = if is_last {
                END_OF_CHAIN
            } else {
                to_offset(cursor)?
            };

            debug!(
                "Sealed chunk {}: {} entries at {}, header {} bytes, data {} bytes",
                index,
                range.len(),
                base,
                header_len,
                data_len
            );

            chunks.push(ChunkLayout {
                base,
                header_len,
                data_len,
                next_chunk_offset,
                entries: range,
            });
            base = cursor;
        }

        if base > u64::from(u32::MAX) {
            return Err(PackError::too_large(base));
        }

        debug!(
            "Resolved layout: {} entries in {} chunks, {} bytes",
            sizes.len(),
            chunks.len(),
            base
        );

        Ok(Self {
            chunks,
            offsets,
            total_len: base,
        })
    }

    /// Chunks in file order.
    pub fn chunks(&self) -> &[ChunkLayout] {
        &self.chunks
    }

    /// Absolute data offsets, one per entry in input order.
    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    /// Absolute data offset of entry `index`.
    pub fn offset(&self, index: usize) -> Option<u32> {
        self.offsets.get(index).copied()
    }

    /// Size of the serialized pack.
    pub fn total_len(&self) -> u64 {
        self.total_len
    }
}

fn chunk_range(index: usize, total: usize) -> Range<usize> {
    let start = index * CHUNK_CAPACITY;
    start.min(total)..(start + CHUNK_CAPACITY).min(total)
}

fn to_offset(position: u64) -> Result<u32> {
    u32::try_from(position).map_err(|_| PackError::too_large(position))
}
