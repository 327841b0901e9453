//! Property tests for pack construction and reading.

use oxipack_archive::{CHUNK_CAPACITY, PackReader, build};
use oxipack_core::Crc32;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::BTreeMap;

/// Distinct ASCII names mapped to short payloads.
fn entry_set(max: usize) -> impl Strategy<Value = BTreeMap<String, Vec<u8>>> {
    prop::collection::btree_map(
        "[a-zA-Z0-9_./-]{1,24}",
        prop::collection::vec(any::<u8>(), 0..64),
        0..max,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every entry comes back with its data and checksum.
    #[test]
    fn roundtrip_preserves_entries(entries in entry_set(600)) {
        let bytes = build(entries.clone()).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let reader = PackReader::new(bytes).map_err(|e| TestCaseError::fail(e.to_string()))?;

        let mut seen = BTreeMap::new();
        for entry in reader.entries() {
            let entry = entry.map_err(|e| TestCaseError::fail(e.to_string()))?;
            let data = reader
                .read_verified(&entry)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(entry.checksum, Crc32::compute(&data));
            seen.insert(entry.name, data);
        }
        prop_assert_eq!(seen, entries);
    }

    /// Chunk count is ceil(n / 255), with one chunk for an empty pack.
    #[test]
    fn chunk_count_follows_capacity(entries in entry_set(800)) {
        let n = entries.len();
        let bytes = build(entries).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let reader = PackReader::new(bytes).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let chunks = reader
            .chunks()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        prop_assert_eq!(chunks.len(), n.div_ceil(CHUNK_CAPACITY).max(1));
        for chunk in &chunks[..chunks.len() - 1] {
            prop_assert_eq!(chunk.entry_count(), CHUNK_CAPACITY);
        }
    }

    /// Arbitrary bytes never panic the reader.
    #[test]
    fn garbage_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let reader = PackReader::new(bytes).map_err(|e| TestCaseError::fail(e.to_string()))?;
        for entry in reader.entries().take(1024) {
            match entry {
                Ok(entry) => {
                    let _ = reader.read_verified(&entry);
                }
                Err(_) => break,
            }
        }
    }
}
