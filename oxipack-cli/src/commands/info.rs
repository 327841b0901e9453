//! Info command implementation.

use crate::utils::format_size;
use oxipack_archive::{CHUNK_CAPACITY, PackReader};
use std::path::Path;

pub fn cmd_info(archive: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let reader = PackReader::open(archive)?;
    let chunks = reader.chunks().collect::<Result<Vec<_>, _>>()?;

    let entry_count: usize = chunks.iter().map(|c| c.entry_count()).sum();
    let header_bytes: u64 = chunks.iter().map(|c| c.header_len).sum();
    let data_bytes: u64 = chunks.iter().map(|c| c.data_len()).sum();
    let size = reader.stream_len();

    println!("Pack Information");
    println!("================");
    println!("File: {}", archive.display());
    println!("Size: {} bytes ({})", size, format_size(size));

    println!();
    println!("Layout:");
    println!("  Chunks: {}", chunks.len());
    println!("  Entries: {}", entry_count);
    println!("  Directory bytes: {}", header_bytes);
    println!("  Data bytes: {}", data_bytes);
    if let Some(last) = chunks.last() {
        println!(
            "  Last chunk fill: {}/{}",
            last.entry_count(),
            CHUNK_CAPACITY
        );
    }
    let trailing = size.saturating_sub(header_bytes + data_bytes);
    if trailing > 0 {
        println!("  Unreferenced bytes: {}", trailing);
    }

    let largest = chunks
        .iter()
        .flat_map(|c| c.entries.iter())
        .max_by_key(|e| e.length);
    if let Some(entry) = largest {
        println!();
        println!("Contents:");
        println!("  Largest entry: {} ({})", entry.name, format_size(u64::from(entry.length)));
        println!(
            "  Average entry: {}",
            format_size(data_bytes / entry_count as u64)
        );
    }

    Ok(())
}
