//! Per-version compression backends
//!
//! The container logic never touches compression details; it talks to a
//! [`ChunkCompressor`] capability. Version 3 archives use a zlib stream
//! (deflate with the 2-byte zlib header), version 4 archives use zstd with a
//! caller-selected level. Both are consumed as opaque compress/decompress
//! operations.

use std::fmt;
use std::io::Read;

use flate2::Compression;
use flate2::read::{ZlibDecoder, ZlibEncoder};

use super::error::{ChunkError, ChunkResult};

/// Compress/decompress capability for one archive version
pub trait ChunkCompressor: fmt::Debug {
    /// Compress one chunk worth of data
    fn compress(&self, data: &[u8]) -> ChunkResult<Vec<u8>>;

    /// Decompress one chunk, expected to yield `expected_len` bytes
    ///
    /// Implementations may return more or fewer bytes on corrupt input; the
    /// framing layer validates the exact length.
    fn decompress(&self, data: &[u8], expected_len: usize) -> ChunkResult<Vec<u8>>;
}

/// Version 3 backend: zlib streams via flate2
///
/// The write path always emits the default-level zlib header bytes; the read
/// path accepts any valid zlib stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZlibCodec;

impl ChunkCompressor for ZlibCodec {
    fn compress(&self, data: &[u8]) -> ChunkResult<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(data, Compression::default());
        let mut compressed = Vec::new();
        encoder
            .read_to_end(&mut compressed)
            .map_err(|e| ChunkError::Compression(format!("zlib compression failed: {e}")))?;
        Ok(compressed)
    }

    fn decompress(&self, data: &[u8], expected_len: usize) -> ChunkResult<Vec<u8>> {
        let decoder = ZlibDecoder::new(data);
        let mut decompressed = Vec::with_capacity(expected_len);
        // Read one byte past the expected length so an oversized stream shows
        // up as a length mismatch instead of unbounded growth.
        decoder
            .take(expected_len as u64 + 1)
            .read_to_end(&mut decompressed)
            .map_err(|e| ChunkError::Compression(format!("zlib decompression failed: {e}")))?;
        Ok(decompressed)
    }
}

/// Version 4 backend: zstd with a caller-selected level
///
/// The level is passed through unopinionated; callers pick the effort that
/// suits their build pipeline.
#[derive(Debug, Clone, Copy)]
pub struct ZstdCodec {
    level: i32,
}

impl ZstdCodec {
    /// Create a backend with the given zstd compression level
    pub fn new(level: i32) -> Self {
        Self { level }
    }

    /// The configured compression level
    pub fn level(&self) -> i32 {
        self.level
    }
}

impl Default for ZstdCodec {
    fn default() -> Self {
        Self {
            level: zstd::DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl ChunkCompressor for ZstdCodec {
    fn compress(&self, data: &[u8]) -> ChunkResult<Vec<u8>> {
        zstd::bulk::compress(data, self.level)
            .map_err(|e| ChunkError::Compression(format!("zstd compression failed: {e}")))
    }

    fn decompress(&self, data: &[u8], expected_len: usize) -> ChunkResult<Vec<u8>> {
        zstd::bulk::decompress(data, expected_len)
            .map_err(|e| ChunkError::Compression(format!("zstd decompression failed: {e}")))
    }
}
