//! Chunk header structures.
//!
//! A pack is a chain of chunks. Every chunk starts with a directory page and
//! is followed by the data of the entries it describes:
//!
//! ```text
//! Chunk      := next_chunk_offset:u32 entry_count:u32 FileHeader{entry_count} Data{entry_count}
//! FileHeader := name_length:u32 name:byte{name_length} offset:u32 length:u32 checksum:u32
//! ```
//!
//! All integers are big-endian. `next_chunk_offset == 0` ends the chain.

use oxipack_core::{PackError, PackSource, Result};
use std::io::{self, Write};

/// Maximum number of file headers in one chunk.
pub const CHUNK_CAPACITY: usize = 255;

/// `next_chunk_offset` value marking the final chunk.
pub const END_OF_CHAIN: u32 = 0;

/// Size of `next_chunk_offset` plus `entry_count`.
pub const CHUNK_PREFIX_LEN: usize = 8;

/// Size of a file header excluding the name bytes.
pub const FILE_HEADER_FIXED_LEN: usize = 16;

/// One file header record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    /// Entry name (ASCII, not terminated).
    pub name: Vec<u8>,
    /// Absolute offset of the entry data.
    pub offset: u32,
    /// Length of the entry data.
    pub length: u32,
    /// CRC-32 of the entry data.
    pub checksum: u32,
}

impl FileHeader {
    /// Serialized size of this record.
    pub fn encoded_len(&self) -> usize {
        FILE_HEADER_FIXED_LEN + self.name.len()
    }

    /// Serialize this record.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&(self.name.len() as u32).to_be_bytes())?;
        writer.write_all(&self.name)?;
        writer.write_all(&self.offset.to_be_bytes())?;
        writer.write_all(&self.length.to_be_bytes())?;
        writer.write_all(&self.checksum.to_be_bytes())?;
        Ok(())
    }

    /// Absolute end offset of the entry data.
    pub fn data_end(&self) -> u64 {
        u64::from(self.offset) + u64::from(self.length)
    }
}

/// A chunk's directory page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Offset of the next chunk, or [`END_OF_CHAIN`].
    pub next_chunk_offset: u32,
    /// File headers in data order.
    pub files: Vec<FileHeader>,
}

impl ChunkHeader {
    /// Number of file headers.
    pub fn entry_count(&self) -> u32 {
        self.files.len() as u32
    }

    /// Whether this chunk ends the chain.
    pub fn is_last(&self) -> bool {
        self.next_chunk_offset == END_OF_CHAIN
    }

    /// Serialized size of the directory page.
    ///
    /// Offsets occupy four bytes whatever their value, so the size is final as
    /// soon as the names are known.
    pub fn encoded_len(&self) -> usize {
        CHUNK_PREFIX_LEN + self.files.iter().map(FileHeader::encoded_len).sum::<usize>()
    }

    /// Total length of the data described by this page.
    pub fn data_len(&self) -> u64 {
        self.files.iter().map(|f| u64::from(f.length)).sum()
    }

    /// Serialize the directory page.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.next_chunk_offset.to_be_bytes())?;
        writer.write_all(&self.entry_count().to_be_bytes())?;
        for file in &self.files {
            file.write_to(writer)?;
        }
        Ok(())
    }

    /// Serialize the directory page into a new buffer.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        // Writing to a Vec cannot fail.
        let _ = self.write_to(&mut buf);
        buf
    }

    /// Parse the directory page starting at `base`.
    ///
    /// Every declared length is checked against `stream_len` before it is
    /// read, so a corrupt count or name length never triggers a large
    /// allocation. Chain-level rules (direction of `next_chunk_offset`,
    /// placement of empty chunks) are left to the caller.
    pub fn read<S: PackSource + ?Sized>(
        source: &S,
        base: u64,
        stream_len: u64,
        max_name_len: usize,
    ) -> Result<Self> {
        let mut cursor = HeaderCursor {
            source,
            pos: base,
            stream_len,
        };

        let next_chunk_offset = cursor.read_u32()?;
        let count_pos = cursor.pos;
        let entry_count = cursor.read_u32()? as usize;
        if entry_count > CHUNK_CAPACITY {
            return Err(PackError::format(
                count_pos,
                format!(
                    "entry count {} exceeds chunk capacity {}",
                    entry_count, CHUNK_CAPACITY
                ),
            ));
        }

        let mut files = Vec::with_capacity(entry_count);
        for index in 0..entry_count {
            let name_pos = cursor.pos;
            let name_len = cursor.read_u32()? as usize;
            if name_len == 0 {
                return Err(PackError::format(
                    name_pos,
                    format!("file header {} has an empty name", index),
                ));
            }
            if name_len > max_name_len {
                return Err(PackError::format(
                    name_pos,
                    format!(
                        "file header {} declares a {}-byte name, limit is {}",
                        index, name_len, max_name_len
                    ),
                ));
            }
            let name = cursor.read_bytes(name_len)?;
            let offset_pos = cursor.pos;
            let offset = cursor.read_u32()?;
            let length = cursor.read_u32()?;
            let checksum = cursor.read_u32()?;

            let header = FileHeader {
                name,
                offset,
                length,
                checksum,
            };
            if header.data_end() > stream_len {
                return Err(PackError::format(
                    offset_pos,
                    format!(
                        "data of '{}' ({}..{}) lies past the end of the stream ({} bytes)",
                        String::from_utf8_lossy(&header.name),
                        header.offset,
                        header.data_end(),
                        stream_len
                    ),
                ));
            }
            files.push(header);
        }

        Ok(Self {
            next_chunk_offset,
            files,
        })
    }
}

/// Bounds-checked sequential reads over a positioned source.
struct HeaderCursor<'a, S: ?Sized> {
    source: &'a S,
    pos: u64,
    stream_len: u64,
}

impl<S: PackSource + ?Sized> HeaderCursor<'_, S> {
    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let end = self.pos.saturating_add(len as u64);
        if end > self.stream_len {
            return Err(PackError::truncated(self.pos, len as u64, self.stream_len));
        }
        let mut buf = vec![0u8; len];
        self.source.read_exact_at(&mut buf, self.pos)?;
        self.pos = end;
        Ok(buf)
    }

    fn read_u32(&mut self) -> Result<u32> {
        if self.pos.saturating_add(4) > self.stream_len {
            return Err(PackError::truncated(self.pos, 4, self.stream_len));
        }
        let mut buf = [0u8; 4];
        self.source.read_exact_at(&mut buf, self.pos)?;
        self.pos += 4;
        Ok(u32::from_be_bytes(buf))
    }
}
