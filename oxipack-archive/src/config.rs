//! Pack builder/reader configuration.

use oxipack_core::MAX_NAME_LEN;

/// Settings shared by [`PackBuilder`](crate::PackBuilder) and
/// [`PackReader`](crate::PackReader).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackConfig {
    /// Longest entry name accepted, in bytes.
    ///
    /// The builder rejects longer names as invalid entries; the reader treats
    /// a header declaring a longer name as malformed.
    pub max_name_len: usize,
    /// Whether every data fetch through the reader is checked against the
    /// stored CRC-32. Directory scans never touch entry data either way.
    pub verify: bool,
}

impl PackConfig {
    /// Default configuration: 65535-byte names, unverified reads.
    pub const DEFAULT: Self = Self {
        max_name_len: MAX_NAME_LEN,
        verify: false,
    };

    /// Default limits with every read verified.
    pub const VERIFIED: Self = Self {
        max_name_len: MAX_NAME_LEN,
        verify: true,
    };

    /// Create the default configuration.
    pub fn new() -> Self {
        Self::DEFAULT
    }

    /// Set the name length limit.
    pub fn with_max_name_len(mut self, max_name_len: usize) -> Self {
        self.max_name_len = max_name_len;
        self
    }

    /// Enable or disable verification on every read.
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }
}

impl Default for PackConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PackConfig::default();
        assert_eq!(config.max_name_len, 65535);
        assert!(!config.verify);
        assert_eq!(config, PackConfig::new());
    }

    #[test]
    fn test_builders() {
        let config = PackConfig::new().with_max_name_len(64).with_verify(true);
        assert_eq!(config.max_name_len, 64);
        assert!(config.verify);
        assert_eq!(PackConfig::VERIFIED.with_max_name_len(64), config);
    }
}
