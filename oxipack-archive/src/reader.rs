//! Pack reading.
//!
//! [`PackReader`] walks the chunk chain lazily: nothing is read until a
//! [`Chunks`] or [`Entries`] iterator is advanced, and entry data is only
//! fetched by an explicit [`read`](PackReader::read). All reads are
//! positioned, so one reader may serve several threads when its source is
//! `Sync`.
//!
//! Structural problems end the walk with [`PackError::Format`]. Checksum
//! mismatches are per entry: [`PackReader::verify_all`] records them and
//! keeps going.

use crate::chunk::{CHUNK_PREFIX_LEN, ChunkHeader};
use crate::config::PackConfig;
use oxipack_core::{Crc32, Entry, PackError, PackSource, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, trace, warn};

/// Block size for streaming entry data.
const COPY_BLOCK: usize = 64 * 1024;

/// Reader for pack archives over any positioned-read source.
#[derive(Debug)]
pub struct PackReader<S> {
    source: S,
    len: u64,
    config: PackConfig,
}

impl PackReader<File> {
    /// Open the pack at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(File::open(path.as_ref())?)
    }
}

#[cfg(feature = "mmap")]
impl PackReader<oxipack_core::MappedPack> {
    /// Open the pack at `path` through a read-only memory mapping.
    pub fn open_mmap<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(oxipack_core::MappedPack::open(path)?)
    }
}

impl<S: PackSource> PackReader<S> {
    /// Create a reader with the default configuration.
    pub fn new(source: S) -> Result<Self> {
        Self::with_config(source, PackConfig::DEFAULT)
    }

    /// Create a reader with a custom configuration.
    pub fn with_config(source: S, config: PackConfig) -> Result<Self> {
        let len = source.len()?;
        Ok(Self {
            source,
            len,
            config,
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Length of the underlying stream.
    pub fn stream_len(&self) -> u64 {
        self.len
    }

    /// Get a reference to the underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Consume the reader, returning the source.
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Iterate over chunks in chain order.
    pub fn chunks(&self) -> Chunks<'_, S> {
        Chunks {
            reader: self,
            state: WalkState::Reading {
                offset: 0,
                index: 0,
            },
        }
    }

    /// Iterate over entries in chain order.
    pub fn entries(&self) -> Entries<'_, S> {
        Entries {
            chunks: self.chunks(),
            pending: Vec::new().into_iter(),
        }
    }

    /// Find the first entry named `name`.
    pub fn find(&self, name: &str) -> Result<Option<Entry>> {
        for entry in self.entries() {
            let entry = entry?;
            if entry.name == name {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    /// Walk the whole chain and index entries by name.
    pub fn index(&self) -> Result<PackIndex> {
        let entries = self.entries().collect::<Result<Vec<_>>>()?;
        debug!("Indexed {} entries", entries.len());
        Ok(PackIndex::new(entries))
    }

    /// Fetch an entry's data, verifying it if the reader is configured to.
    pub fn read(&self, entry: &Entry) -> Result<Vec<u8>> {
        if self.config.verify {
            self.read_verified(entry)
        } else {
            self.fetch(entry)
        }
    }

    /// Fetch an entry's data and check it against the stored checksum.
    pub fn read_verified(&self, entry: &Entry) -> Result<Vec<u8>> {
        let data = self.fetch(entry)?;
        entry.verify(&data)?;
        Ok(data)
    }

    /// Fetch the data of the first entry named `name`.
    pub fn read_by_name(&self, name: &str) -> Result<Vec<u8>> {
        match self.find(name)? {
            Some(entry) => self.read(&entry),
            None => Err(PackError::entry_not_found(name)),
        }
    }

    /// Stream an entry's data into `writer`, returning the bytes copied.
    ///
    /// With `verify` (or a verifying configuration) the checksum is computed
    /// while copying; a mismatch is reported after all data has been
    /// written.
    pub fn extract_to<W: Write>(&self, entry: &Entry, mut writer: W, verify: bool) -> Result<u64> {
        self.check_bounds(entry)?;
        let verify = verify || self.config.verify;

        let mut crc = Crc32::new();
        let mut buf = vec![0u8; COPY_BLOCK.min(entry.length as usize)];
        let mut pos = u64::from(entry.offset);
        let mut remaining = entry.length as usize;
        while remaining > 0 {
            let n = remaining.min(buf.len());
            self.source.read_exact_at(&mut buf[..n], pos)?;
            if verify {
                crc.update(&buf[..n]);
            }
            writer.write_all(&buf[..n])?;
            pos += n as u64;
            remaining -= n;
        }

        if verify {
            let computed = crc.finalize();
            if computed != entry.checksum {
                return Err(PackError::integrity(&entry.name, entry.checksum, computed));
            }
        }
        Ok(u64::from(entry.length))
    }

    /// Check an entry's data against its checksum without keeping it.
    pub fn verify(&self, entry: &Entry) -> Result<()> {
        self.extract_to(entry, std::io::sink(), true).map(|_| ())
    }

    /// Verify every entry.
    ///
    /// A malformed chain fails the whole call; a corrupt entry is recorded in
    /// the report and the remaining entries are still checked.
    pub fn verify_all(&self) -> Result<VerifyReport> {
        let entries = self.entries().collect::<Result<Vec<_>>>()?;
        let results = entries
            .into_iter()
            .map(|entry| self.verify_one(entry))
            .collect();
        Ok(VerifyReport { results })
    }

    fn verify_one(&self, entry: Entry) -> EntryStatus {
        let error = self.verify(&entry).err();
        if let Some(err) = &error {
            warn!("Entry '{}' failed verification: {}", entry.name, err);
        }
        EntryStatus { entry, error }
    }

    fn fetch(&self, entry: &Entry) -> Result<Vec<u8>> {
        self.check_bounds(entry)?;
        let mut data = vec![0u8; entry.length as usize];
        self.source.read_exact_at(&mut data, u64::from(entry.offset))?;
        Ok(data)
    }

    fn check_bounds(&self, entry: &Entry) -> Result<()> {
        let range = entry.data_range();
        if range.end > self.len {
            return Err(PackError::truncated(
                range.start,
                u64::from(entry.length),
                self.len,
            ));
        }
        Ok(())
    }

    fn read_chunk(&self, offset: u64, index: usize) -> Result<ChunkInfo> {
        let header = ChunkHeader::read(&self.source, offset, self.len, self.config.max_name_len)?;
        let header_len = header.encoded_len() as u64;
        let next = u64::from(header.next_chunk_offset);

        if header.files.is_empty() && !(offset == 0 && header.is_last()) {
            return Err(PackError::format(
                offset,
                "empty chunk inside a chain; only a lone chunk may have no entries",
            ));
        }
        if !header.is_last() {
            if next < offset + header_len {
                return Err(PackError::format(
                    offset,
                    format!(
                        "next chunk offset {} points back into or before this chunk",
                        next
                    ),
                ));
            }
            if next + CHUNK_PREFIX_LEN as u64 > self.len {
                return Err(PackError::format(
                    offset,
                    format!(
                        "next chunk offset {} lies outside the stream ({} bytes)",
                        next, self.len
                    ),
                ));
            }
        }

        let mut entries = Vec::with_capacity(header.files.len());
        for file in header.files {
            if !file.name.is_ascii() {
                return Err(PackError::format(
                    offset,
                    format!(
                        "entry name '{}' is not ASCII",
                        String::from_utf8_lossy(&file.name)
                    ),
                ));
            }
            entries.push(Entry {
                name: String::from_utf8_lossy(&file.name).into_owned(),
                offset: file.offset,
                length: file.length,
                checksum: file.checksum,
                chunk: index,
            });
        }

        trace!(
            "Chunk {} at {}: {} entries, next {}",
            index,
            offset,
            entries.len(),
            header.next_chunk_offset
        );

        Ok(ChunkInfo {
            index,
            offset,
            header_len,
            next_chunk_offset: header.next_chunk_offset,
            entries,
        })
    }
}

#[cfg(feature = "parallel")]
impl<S: PackSource + Sync> PackReader<S> {
    /// Verify every entry, spreading the work over the rayon thread pool.
    ///
    /// Same outcome as [`verify_all`](Self::verify_all), in the same order.
    pub fn par_verify_all(&self) -> Result<VerifyReport> {
        use rayon::prelude::*;

        let entries = self.entries().collect::<Result<Vec<_>>>()?;
        let results = entries
            .into_par_iter()
            .map(|entry| self.verify_one(entry))
            .collect();
        Ok(VerifyReport { results })
    }
}

/// One chunk as read from the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkInfo {
    /// Position in the chain, starting at zero.
    pub index: usize,
    /// Absolute offset of the chunk's directory page.
    pub offset: u64,
    /// Size of the directory page.
    pub header_len: u64,
    /// Stored `next_chunk_offset`.
    pub next_chunk_offset: u32,
    /// Entries described by this chunk.
    pub entries: Vec<Entry>,
}

impl ChunkInfo {
    /// Number of entries.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Total length of the chunk's entry data.
    pub fn data_len(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.length)).sum()
    }

    /// Whether this chunk ends the chain.
    pub fn is_last(&self) -> bool {
        self.next_chunk_offset == crate::chunk::END_OF_CHAIN
    }
}

#[derive(Debug, Clone, Copy)]
enum WalkState {
    Reading { offset: u64, index: usize },
    Done,
}

/// Lazy iterator over the chunk chain.
///
/// Stops after the terminal chunk or after the first error.
pub struct Chunks<'a, S> {
    reader: &'a PackReader<S>,
    state: WalkState,
}

impl<S: PackSource> Iterator for Chunks<'_, S> {
    type Item = Result<ChunkInfo>;

    fn next(&mut self) -> Option<Self::Item> {
        let WalkState::Reading { offset, index } = self.state else {
            return None;
        };

        match self.reader.read_chunk(offset, index) {
            Ok(chunk) => {
                self.state = if chunk.is_last() {
                    WalkState::Done
                } else {
                    WalkState::Reading {
                        offset: u64::from(chunk.next_chunk_offset),
                        index: index + 1,
                    }
                };
                Some(Ok(chunk))
            }
            Err(err) => {
                self.state = WalkState::Done;
                Some(Err(err))
            }
        }
    }
}

/// Lazy iterator over entries, chunk by chunk.
pub struct Entries<'a, S> {
    chunks: Chunks<'a, S>,
    pending: std::vec::IntoIter<Entry>,
}

impl<S: PackSource> Iterator for Entries<'_, S> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.pending.next() {
                return Some(Ok(entry));
            }
            match self.chunks.next()? {
                Ok(chunk) => self.pending = chunk.entries.into_iter(),
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

/// Name lookup table over a fully walked pack.
#[derive(Debug, Clone, Default)]
pub struct PackIndex {
    entries: Vec<Entry>,
    by_name: HashMap<String, usize>,
}

impl PackIndex {
    /// Index `entries`; the first of several same-named entries wins.
    pub fn new(entries: Vec<Entry>) -> Self {
        let mut by_name = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            by_name.entry(entry.name.clone()).or_insert(i);
        }
        Self { entries, by_name }
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    /// Whether an entry named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// All entries in chain order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the pack has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in chain order.
    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }
}

/// Verification outcome of one entry.
#[derive(Debug)]
pub struct EntryStatus {
    /// The entry checked.
    pub entry: Entry,
    /// Why it failed, if it did.
    pub error: Option<PackError>,
}

impl EntryStatus {
    /// Whether the entry verified.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of [`PackReader::verify_all`].
#[derive(Debug, Default)]
pub struct VerifyReport {
    results: Vec<EntryStatus>,
}

impl VerifyReport {
    /// Per-entry outcomes in chain order.
    pub fn results(&self) -> &[EntryStatus] {
        &self.results
    }

    /// Entries that failed.
    pub fn failures(&self) -> impl Iterator<Item = &EntryStatus> {
        self.results.iter().filter(|s| !s.is_ok())
    }

    /// Number of entries that verified.
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|s| s.is_ok()).count()
    }

    /// Number of entries that failed.
    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }

    /// Whether every entry verified.
    pub fn is_ok(&self) -> bool {
        self.results.iter().all(EntryStatus::is_ok)
    }
}
