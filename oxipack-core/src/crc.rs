//! CRC-32 checksum engine.
//!
//! Every entry stored in a pack carries the CRC-32 of its raw bytes. The
//! variant is the conventional reflected one used by ZIP, GZIP and PNG:
//!
//! - Polynomial: 0x04C11DB7 (reflected: 0xEDB88320)
//! - Initial value: 0xFFFFFFFF
//! - Final XOR: 0xFFFFFFFF
//!
//! The lookup table is an immutable value. The table for the default
//! polynomial is built at compile time and shared process-wide; a caller that
//! needs a different polynomial builds its own [`Crc32Table`] and hands it to
//! [`Crc32::with_table`].

use std::io;

/// Reflected CRC-32 polynomial used by pack files.
pub const CRC32_POLYNOMIAL: u32 = 0xEDB88320;

/// Initial value of the running hash.
pub const CRC32_SEED: u32 = 0xFFFFFFFF;

/// Table for [`CRC32_POLYNOMIAL`], evaluated once at compile time.
static DEFAULT_TABLE: Crc32Table = Crc32Table::new(CRC32_POLYNOMIAL);

/// A 256-entry lookup table for one reflected polynomial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crc32Table {
    polynomial: u32,
    entries: [u32; 256],
}

impl Crc32Table {
    /// Build the table for a reflected polynomial.
    pub const fn new(polynomial: u32) -> Self {
        let mut entries = [0u32; 256];
        let mut i = 0usize;
        while i < 256 {
            let mut entry = i as u32;
            let mut j = 0;
            while j < 8 {
                if entry & 1 != 0 {
                    entry = (entry >> 1) ^ polynomial;
                } else {
                    entry >>= 1;
                }
                j += 1;
            }
            entries[i] = entry;
            i += 1;
        }
        Self {
            polynomial,
            entries,
        }
    }

    /// The shared table for [`CRC32_POLYNOMIAL`].
    pub fn standard() -> &'static Crc32Table {
        &DEFAULT_TABLE
    }

    /// Polynomial this table was built for.
    pub fn polynomial(&self) -> u32 {
        self.polynomial
    }

    /// Table entry for a byte value.
    #[inline(always)]
    pub fn entry(&self, index: u8) -> u32 {
        self.entries[index as usize]
    }

    /// One-shot checksum of `data` using the default seed.
    pub fn checksum(&self, data: &[u8]) -> u32 {
        let mut crc = Crc32::with_table(self, CRC32_SEED);
        crc.update(data);
        crc.finalize()
    }

    /// Advance a running (uncomplemented) hash over `data`.
    #[inline]
    fn advance(&self, mut crc: u32, data: &[u8]) -> u32 {
        for &byte in data {
            let index = ((crc & 0xFF) as u8) ^ byte;
            crc = (crc >> 8) ^ self.entries[index as usize];
        }
        crc
    }
}

impl Default for Crc32Table {
    fn default() -> Self {
        DEFAULT_TABLE.clone()
    }
}

/// Incremental CRC-32 calculator.
///
/// # Example
///
/// ```
/// use oxipack_core::crc::Crc32;
///
/// let mut crc = Crc32::new();
/// crc.update(b"12345");
/// crc.update(b"6789");
/// assert_eq!(crc.finalize(), 0xCBF43926);
/// ```
#[derive(Debug, Clone)]
pub struct Crc32<'t> {
    table: &'t Crc32Table,
    seed: u32,
    crc: u32,
}

impl Crc32<'static> {
    /// Create a calculator over the standard table and seed.
    pub fn new() -> Self {
        Self::with_table(Crc32Table::standard(), CRC32_SEED)
    }

    /// Compute the CRC-32 of a slice in one call.
    #[inline]
    pub fn compute(data: &[u8]) -> u32 {
        DEFAULT_TABLE.checksum(data)
    }
}

impl<'t> Crc32<'t> {
    /// Create a calculator over a caller-owned table.
    pub fn with_table(table: &'t Crc32Table, seed: u32) -> Self {
        Self {
            table,
            seed,
            crc: seed,
        }
    }

    /// Reset to the initial seed.
    pub fn reset(&mut self) {
        self.crc = self.seed;
    }

    /// Feed more bytes.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        self.crc = self.table.advance(self.crc, data);
    }

    /// Current checksum without consuming the calculator.
    #[inline(always)]
    pub fn value(&self) -> u32 {
        !self.crc
    }

    /// Finalize and return the checksum.
    #[inline(always)]
    pub fn finalize(self) -> u32 {
        !self.crc
    }
}

impl Default for Crc32<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl io::Write for Crc32<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_crc32_empty() {
        assert_eq!(Crc32::compute(b""), 0x00000000);
    }

    #[test]
    fn test_crc32_check() {
        // Standard CRC-32 check value for "123456789"
        assert_eq!(Crc32::compute(b"123456789"), 0xCBF43926);
    }

    #[test]
    fn test_crc32_hello_world() {
        assert_eq!(Crc32::compute(b"Hello, World!"), 0xEC4AC3D0);
    }

    #[test]
    fn test_crc32_incremental() {
        let mut crc = Crc32::new();
        crc.update(b"Hello");
        crc.update(b", ");
        assert_eq!(crc.value(), Crc32::compute(b"Hello, "));
        crc.update(b"World!");
        assert_eq!(crc.finalize(), 0xEC4AC3D0);
    }

    #[test]
    fn test_crc32_every_split_point() {
        let data = b"The quick brown fox jumps over the lazy dog";
        let whole = Crc32::compute(data);
        for split in 0..=data.len() {
            let mut crc = Crc32::new();
            crc.update(&data[..split]);
            crc.update(&data[split..]);
            assert_eq!(crc.finalize(), whole, "split at {}", split);
        }
    }

    #[test]
    fn test_crc32_reset() {
        let mut crc = Crc32::new();
        crc.update(b"garbage");
        crc.reset();
        crc.update(b"123456789");
        assert_eq!(crc.finalize(), 0xCBF43926);
    }

    #[test]
    fn test_crc32_table_correctness() {
        let table = Crc32Table::standard();
        assert_eq!(table.entry(0), 0x00000000);
        assert_eq!(table.entry(1), 0x77073096);
        assert_eq!(table.entry(255), 0x2D02EF8D);
        assert_eq!(table.polynomial(), CRC32_POLYNOMIAL);
    }

    #[test]
    fn test_runtime_table_matches_static() {
        let table = Crc32Table::new(CRC32_POLYNOMIAL);
        assert_eq!(&table, Crc32Table::standard());
        assert_eq!(table.checksum(b"123456789"), 0xCBF43926);
    }

    #[test]
    fn test_custom_polynomial() {
        // CRC-32C (Castagnoli), reflected polynomial 0x82F63B78
        let table = Crc32Table::new(0x82F63B78);
        assert_eq!(table.checksum(b"123456789"), 0xE3069283);

        let mut crc = Crc32::with_table(&table, CRC32_SEED);
        crc.update(b"1234");
        crc.update(b"56789");
        assert_eq!(crc.finalize(), 0xE3069283);
    }

    #[test]
    fn test_io_write() {
        let mut crc = Crc32::new();
        let mut src: &[u8] = b"123456789";
        std::io::copy(&mut src, &mut crc).unwrap();
        crc.flush().unwrap();
        assert_eq!(crc.finalize(), 0xCBF43926);
    }

    #[test]
    fn test_single_bit_flips_change_checksum() {
        let data = vec![0x5Au8; 64];
        let original = Crc32::compute(&data);
        for bit in 0..data.len() * 8 {
            let mut flipped = data.clone();
            flipped[bit / 8] ^= 1 << (bit % 8);
            assert_ne!(Crc32::compute(&flipped), original, "bit {}", bit);
        }
    }

    #[test]
    fn test_concurrent_one_shot() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| Crc32::compute(b"123456789")))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 0xCBF43926);
        }
    }
}
