//! List command implementation.

use crate::utils::{filter_entries, print_entries};
use oxipack_archive::{ChunkInfo, PackReader};
use oxipack_core::Entry;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// JSON serializable entry data for pack listings.
#[derive(Debug, Serialize, Deserialize)]
struct EntryJson {
    name: String,
    offset: u32,
    length: u32,
    crc32: String,
    chunk: usize,
}

impl EntryJson {
    fn from_entry(entry: &Entry) -> Self {
        Self {
            name: entry.name.clone(),
            offset: entry.offset,
            length: entry.length,
            crc32: format!("{:08x}", entry.checksum),
            chunk: entry.chunk,
        }
    }
}

/// JSON serializable chunk data.
#[derive(Debug, Serialize, Deserialize)]
struct ChunkJson {
    index: usize,
    offset: u64,
    header_len: u64,
    data_len: u64,
    entry_count: usize,
    next_chunk_offset: u32,
}

impl ChunkJson {
    fn from_chunk(chunk: &ChunkInfo) -> Self {
        Self {
            index: chunk.index,
            offset: chunk.offset,
            header_len: chunk.header_len,
            data_len: chunk.data_len(),
            entry_count: chunk.entry_count(),
            next_chunk_offset: chunk.next_chunk_offset,
        }
    }
}

/// JSON output for pack listing.
#[derive(Debug, Serialize, Deserialize)]
struct PackListJson {
    archive: String,
    size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    chunks: Option<Vec<ChunkJson>>,
    entries: Vec<EntryJson>,
}

/// Options for listing pack contents.
pub struct ListOptions<'a> {
    pub verbose: bool,
    pub json: bool,
    pub chunks: bool,
    pub include: &'a [String],
    pub exclude: &'a [String],
}

pub fn cmd_list(archive: &Path, options: &ListOptions) -> Result<(), Box<dyn std::error::Error>> {
    let reader = PackReader::open(archive)?;
    let chunks = reader.chunks().collect::<Result<Vec<_>, _>>()?;
    let entries: Vec<Entry> = chunks.iter().flat_map(|c| c.entries.clone()).collect();
    let entries = filter_entries(entries, options.include, options.exclude);

    if options.json {
        let listing = PackListJson {
            archive: archive.display().to_string(),
            size: reader.stream_len(),
            chunks: options
                .chunks
                .then(|| chunks.iter().map(ChunkJson::from_chunk).collect()),
            entries: entries.iter().map(EntryJson::from_entry).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("Archive: {}", archive.display());
    println!();

    if options.chunks {
        print_chunks(&chunks);
        println!();
    }
    print_entries(&entries, options.verbose);
    Ok(())
}

fn print_chunks(chunks: &[ChunkInfo]) {
    println!(
        "{:>5} {:>10} {:>8} {:>10} {:>7} {:>10}",
        "Chunk", "Offset", "Header", "Data", "Entries", "Next"
    );
    for chunk in chunks {
        let next = if chunk.is_last() {
            "end".to_string()
        } else {
            chunk.next_chunk_offset.to_string()
        };
        println!(
            "{:>5} {:>10} {:>8} {:>10} {:>7} {:>10}",
            chunk.index,
            chunk.offset,
            chunk.header_len,
            chunk.data_len(),
            chunk.entry_count(),
            next
        );
    }
}
