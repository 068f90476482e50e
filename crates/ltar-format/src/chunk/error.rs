//! Error types for the chunked stream codec

use thiserror::Error;

/// Chunk codec result type
pub type ChunkResult<T> = Result<T, ChunkError>;

/// Errors raised while encoding or decoding chunked file data
#[derive(Debug, Error)]
pub enum ChunkError {
    /// Chunk header size fields outside the valid range
    #[error(
        "corrupt chunk header: compressed size {compressed}, original size {original} \
         (chunk limit {limit})"
    )]
    CorruptChunkHeader {
        /// Compressed size field as read
        compressed: u32,
        /// Original size field as read
        original: u32,
        /// Maximum original bytes a chunk may carry
        limit: u32,
    },

    /// Backend produced a different number of bytes than the chunk declared
    #[error("decompression fault: expected {expected} bytes, backend produced {actual}")]
    DecompressionFault {
        /// Original size the chunk header declared
        expected: usize,
        /// Byte count the backend actually produced
        actual: usize,
    },

    /// Compression backend failure
    #[error("compression backend error: {0}")]
    Compression(String),

    /// I/O error on the underlying stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
