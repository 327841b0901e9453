//! Pack construction.
//!
//! [`PackBuilder`] collects named entries, validates each one as it is
//! added, and serializes the whole pack in one pass once every chunk's
//! offsets are resolved. In-memory entries are held by the builder;
//! file-backed entries are checksummed when added and streamed again at
//! write time, so only header metadata is buffered for them.
//!
//! # Example
//!
//! ```rust
//! use oxipack_archive::{PackBuilder, PackReader};
//!
//! let mut builder = PackBuilder::new();
//! builder.add("hello.txt", b"Hello, World!".to_vec())?;
//! builder.add("empty.bin", Vec::new())?;
//! let bytes = builder.build()?;
//!
//! let reader = PackReader::new(bytes)?;
//! let entry = reader.find("hello.txt")?.expect("entry present");
//! assert_eq!(entry.checksum, 0xEC4AC3D0);
//! # Ok::<(), oxipack_core::PackError>(())
//! ```

use crate::chunk::{ChunkHeader, FileHeader};
use crate::config::PackConfig;
use crate::layout::{EntrySize, PackLayout};
use oxipack_core::{Crc32, PackError, Result, validate_name};
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

enum EntryData {
    Memory(Vec<u8>),
    File(PathBuf),
}

struct PendingEntry {
    name: Vec<u8>,
    data: EntryData,
    length: u32,
    checksum: u32,
}

/// Builder for pack archives.
pub struct PackBuilder {
    config: PackConfig,
    entries: Vec<PendingEntry>,
    names: HashSet<Vec<u8>>,
}

impl PackBuilder {
    /// Create a builder with the default configuration.
    pub fn new() -> Self {
        Self::with_config(PackConfig::DEFAULT)
    }

    /// Create a builder with a custom configuration.
    pub fn with_config(config: PackConfig) -> Self {
        Self {
            config,
            entries: Vec::new(),
            names: HashSet::new(),
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Number of entries added so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries have been added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add an in-memory entry.
    ///
    /// The checksum is computed here, once. Entries keep the order in which
    /// they are added.
    pub fn add(&mut self, name: impl Into<Vec<u8>>, data: impl Into<Vec<u8>>) -> Result<()> {
        let name = name.into();
        let data = data.into();
        self.check_name(&name)?;
        let length = entry_length(&name, data.len() as u64)?;
        let checksum = Crc32::compute(&data);
        self.push(PendingEntry {
            name,
            data: EntryData::Memory(data),
            length,
            checksum,
        });
        Ok(())
    }

    /// Add an entry whose data is read from `path` at write time.
    ///
    /// The file is streamed once now to record its length and checksum. If
    /// it changes before the pack is written, the write fails with
    /// [`PackError::InvalidEntry`].
    pub fn add_file(&mut self, name: impl Into<Vec<u8>>, path: impl AsRef<Path>) -> Result<()> {
        let name = name.into();
        let path = path.as_ref();
        self.check_name(&name)?;

        let mut file = File::open(path)?;
        let mut crc = Crc32::new();
        let copied = io::copy(&mut file, &mut crc)?;
        let length = entry_length(&name, copied)?;

        self.push(PendingEntry {
            name,
            data: EntryData::File(path.to_path_buf()),
            length,
            checksum: crc.finalize(),
        });
        Ok(())
    }

    /// Resolve chunk partitioning and every offset without serializing.
    pub fn layout(&self) -> Result<PackLayout> {
        let sizes: Vec<EntrySize> = self
            .entries
            .iter()
            .map(|e| EntrySize::new(e.name.len(), u64::from(e.length)))
            .collect();
        PackLayout::resolve(&sizes)
    }

    /// Serialize the pack into `writer`, returning the number of bytes
    /// written.
    ///
    /// Layout errors are reported before anything is written. A file-backed
    /// entry that changed since it was added is only detected while it is
    /// copied, so `writer` may hold a partial pack on that error; use
    /// [`build`](Self::build) or [`write_to_path`](Self::write_to_path) when
    /// output must be all or nothing.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<u64> {
        let layout = self.layout()?;
        let offsets = layout.offsets();

        for chunk in layout.chunks() {
            let header = ChunkHeader {
                next_chunk_offset: chunk.next_chunk_offset,
                files: self.entries[chunk.entries.clone()]
                    .iter()
                    .zip(&offsets[chunk.entries.clone()])
                    .map(|(e, &offset)| FileHeader {
                        name: e.name.clone(),
                        offset,
                        length: e.length,
                        checksum: e.checksum,
                    })
                    .collect(),
            };
            let encoded = header.encode();
            debug_assert_eq!(encoded.len() as u64, chunk.header_len);
            writer.write_all(&encoded)?;

            for entry in &self.entries[chunk.entries.clone()] {
                match &entry.data {
                    EntryData::Memory(data) => writer.write_all(data)?,
                    EntryData::File(path) => copy_file_entry(entry, path, &mut writer)?,
                }
            }
        }
        writer.flush()?;

        Ok(layout.total_len())
    }

    /// Serialize the pack into memory.
    pub fn build(&self) -> Result<Vec<u8>> {
        let capacity = self.layout()?.total_len() as usize;
        let mut buf = Vec::with_capacity(capacity);
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    /// Write the pack to `path`.
    ///
    /// The pack is written to a temporary file in the same directory and
    /// renamed over `path` only once complete, so a failure leaves any
    /// existing file untouched.
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<u64> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        let written = self.write_to(BufWriter::new(tmp.as_file_mut()))?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| PackError::Io(e.error))?;

        debug!("Wrote {} bytes to {}", written, path.display());
        Ok(written)
    }

    fn check_name(&self, name: &[u8]) -> Result<()> {
        validate_name(name, self.config.max_name_len)?;
        if self.names.contains(name) {
            return Err(PackError::invalid_entry(name, "duplicate entry name"));
        }
        Ok(())
    }

    fn push(&mut self, entry: PendingEntry) {
        self.names.insert(entry.name.clone());
        self.entries.push(entry);
    }
}

impl Default for PackBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PackBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackBuilder")
            .field("config", &self.config)
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// Build a pack from `(name, data)` pairs, in order.
pub fn build<I, N, D>(pairs: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = (N, D)>,
    N: Into<Vec<u8>>,
    D: Into<Vec<u8>>,
{
    let mut builder = PackBuilder::new();
    for (name, data) in pairs {
        builder.add(name, data)?;
    }
    builder.build()
}

fn entry_length(name: &[u8], length: u64) -> Result<u32> {
    u32::try_from(length).map_err(|_| {
        PackError::invalid_entry(
            name,
            format!("{} bytes of data exceeds the 32-bit length field", length),
        )
    })
}

/// Stream a file-backed entry, checking it against the recorded metadata.
fn copy_file_entry<W: Write>(entry: &PendingEntry, path: &Path, writer: &mut W) -> Result<()> {
    let mut file = File::open(path)?;
    let mut sink = ChecksumWriter::new(writer);
    let copied = io::copy(&mut (&mut file).take(u64::from(entry.length)), &mut sink)?;

    let mut probe = [0u8; 1];
    let grew = file.read(&mut probe)? != 0;
    if copied != u64::from(entry.length) || grew {
        return Err(PackError::invalid_entry(
            &entry.name,
            format!("{} changed size while packing", path.display()),
        ));
    }
    if sink.checksum() != entry.checksum {
        return Err(PackError::invalid_entry(
            &entry.name,
            format!("{} changed content while packing", path.display()),
        ));
    }
    Ok(())
}

/// Writer adapter that checksums everything passing through it.
struct ChecksumWriter<W> {
    inner: W,
    crc: Crc32<'static>,
}

impl<W: Write> ChecksumWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            crc: Crc32::new(),
        }
    }

    fn checksum(&self) -> u32 {
        self.crc.value()
    }
}

impl<W: Write> Write for ChecksumWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.crc.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxipack_core::ErrorKind;

    fn be_u32(bytes: &[u8], at: usize) -> u32 {
        u32::from_be_bytes(bytes[at..at + 4].try_into().unwrap())
    }

    #[test]
    fn test_single_entry_bytes() {
        let bytes = build([("a", b"xyz".to_vec())]).unwrap();

        // next, count, name_len, name, offset, length, checksum, data
        assert_eq!(bytes.len(), 8 + 17 + 3);
        assert_eq!(be_u32(&bytes, 0), 0);
        assert_eq!(be_u32(&bytes, 4), 1);
        assert_eq!(be_u32(&bytes, 8), 1);
        assert_eq!(bytes[12], b'a');
        assert_eq!(be_u32(&bytes, 13), 25);
        assert_eq!(be_u32(&bytes, 17), 3);
        assert_eq!(be_u32(&bytes, 21), Crc32::compute(b"xyz"));
        assert_eq!(&bytes[25..], b"xyz");
    }

    #[test]
    fn test_empty_pack() {
        let bytes = PackBuilder::new().build().unwrap();
        assert_eq!(bytes, [0u8; 8]);
    }

    #[test]
    fn test_rejects_bad_names() {
        let mut builder = PackBuilder::new();
        let err = builder.add("", b"data".to_vec()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidEntry);

        let err = builder.add("caf\u{e9}", b"data".to_vec()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidEntry);

        let mut limited = PackBuilder::with_config(PackConfig::new().with_max_name_len(4));
        assert!(limited.add("four", Vec::new()).is_ok());
        assert!(limited.add("fives", Vec::new()).is_err());
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let mut builder = PackBuilder::new();
        builder.add("same", b"1".to_vec()).unwrap();
        let err = builder.add("same", b"2".to_vec()).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_write_to_reports_length() {
        let mut builder = PackBuilder::new();
        builder.add("a.txt", b"alpha".to_vec()).unwrap();
        builder.add("b.txt", b"beta".to_vec()).unwrap();

        let mut out = Vec::new();
        let written = builder.write_to(&mut out).unwrap();
        assert_eq!(written, out.len() as u64);
        assert_eq!(written, builder.layout().unwrap().total_len());
        assert_eq!(out, builder.build().unwrap());
    }

    #[test]
    fn test_file_entry_matches_memory_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.bin");
        std::fs::write(&path, b"file-backed payload").unwrap();

        let mut from_file = PackBuilder::new();
        from_file.add_file("payload.bin", &path).unwrap();
        let mut from_memory = PackBuilder::new();
        from_memory
            .add("payload.bin", b"file-backed payload".to_vec())
            .unwrap();

        assert_eq!(from_file.build().unwrap(), from_memory.build().unwrap());
    }

    #[test]
    fn test_file_changed_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grows.txt");
        std::fs::write(&path, b"short").unwrap();

        let mut builder = PackBuilder::new();
        builder.add_file("grows.txt", &path).unwrap();
        std::fs::write(&path, b"much longer now").unwrap();

        let err = builder.build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidEntry);
        assert!(err.to_string().contains("changed size"));
    }

    #[test]
    fn test_file_changed_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edit.txt");
        std::fs::write(&path, b"before").unwrap();

        let mut builder = PackBuilder::new();
        builder.add_file("edit.txt", &path).unwrap();
        std::fs::write(&path, b"after!").unwrap();

        let err = builder.build().unwrap_err();
        assert!(err.to_string().contains("changed content"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = PackBuilder::new();
        let err = builder
            .add_file("gone", dir.path().join("gone"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(builder.is_empty());
    }

    #[test]
    fn test_write_to_path_keeps_old_file_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.txt");
        let target = dir.path().join("out.pack");
        std::fs::write(&source, b"original").unwrap();
        std::fs::write(&target, b"previous pack").unwrap();

        let mut builder = PackBuilder::new();
        builder.add_file("source.txt", &source).unwrap();
        std::fs::write(&source, b"rewritten contents").unwrap();

        assert!(builder.write_to_path(&target).is_err());
        assert_eq!(std::fs::read(&target).unwrap(), b"previous pack");
        // Only the two files we created remain.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_write_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("new.pack");

        let mut builder = PackBuilder::new();
        builder.add("x", b"1".to_vec()).unwrap();
        let written = builder.write_to_path(&target).unwrap();

        let on_disk = std::fs::read(&target).unwrap();
        assert_eq!(on_disk.len() as u64, written);
        assert_eq!(on_disk, builder.build().unwrap());
    }
}
