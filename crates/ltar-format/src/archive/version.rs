//! Format version variants
//!
//! The two supported on-disk layouts differ in a handful of parameters:
//! name-blob padding, file-entry width, the version 4 filler block, and the
//! compression backend. [`Version`] models them as a closed set chosen once
//! per archive; traversal and codec algorithms are shared.

use crate::chunk::{ChunkCompressor, ZlibCodec, ZstdCodec};

/// Folder table entries are the same width in both versions
pub const FOLDER_ENTRY_LEN: u64 = 16;

/// Supported LTAR format versions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    /// Version 3: padded name blob, 32-bit file flags, zlib chunks
    V3,
    /// Version 4: unpadded name blob, marker + 8-bit flags, filler block,
    /// leveled zstd chunks
    V4,
}

impl Version {
    /// Parse the header's version field
    pub fn from_u32(raw: u32) -> Option<Self> {
        match raw {
            3 => Some(Self::V3),
            4 => Some(Self::V4),
            _ => None,
        }
    }

    /// The header's version field value
    pub fn as_u32(self) -> u32 {
        match self {
            Self::V3 => 3,
            Self::V4 => 4,
        }
    }

    /// Whether names in the blob are padded to 4-byte boundaries
    pub fn pads_names(self) -> bool {
        matches!(self, Self::V3)
    }

    /// On-disk width of one file table entry
    pub fn file_entry_len(self) -> u64 {
        match self {
            // name offset + data offset + stored size + original size + u32 flags
            Self::V3 => 20,
            // as above, but marker byte + u8 flags
            Self::V4 => 18,
        }
    }

    /// Length of the filler block between the folder table and chunk data
    pub fn filler_len(self, file_count: u32) -> u64 {
        match self {
            Self::V3 => 0,
            Self::V4 => 6 * u64::from(file_count),
        }
    }

    /// The compression backend this version multiplexes chunk data through
    ///
    /// `level` applies to the version 4 backend only; version 3 always
    /// writes default-level zlib streams.
    pub fn codec(self, level: i32) -> Box<dyn ChunkCompressor> {
        match self {
            Self::V3 => Box::new(ZlibCodec),
            Self::V4 => Box::new(ZstdCodec::new(level)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_field_round_trips() {
        assert_eq!(Version::from_u32(3), Some(Version::V3));
        assert_eq!(Version::from_u32(4), Some(Version::V4));
        assert_eq!(Version::from_u32(5), None);
        assert_eq!(Version::from_u32(0), None);
        assert_eq!(Version::V3.as_u32(), 3);
        assert_eq!(Version::V4.as_u32(), 4);
    }

    #[test]
    fn layout_parameters() {
        assert!(Version::V3.pads_names());
        assert!(!Version::V4.pads_names());
        assert_eq!(Version::V3.file_entry_len(), 20);
        assert_eq!(Version::V4.file_entry_len(), 18);
        assert_eq!(Version::V3.filler_len(100), 0);
        assert_eq!(Version::V4.filler_len(100), 600);
    }
}
