//! Error types for archive operations

use thiserror::Error;

use crate::chunk::ChunkError;

/// Archive operation result type
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Errors raised while reading or writing an archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Stream does not start with either LTAR magic marker
    #[error("not an LTAR archive: magic {magic:02x?}")]
    FormatMismatch {
        /// The four bytes found where the magic was expected
        magic: [u8; 4],
    },

    /// Format version outside the supported set {3, 4}
    #[error("unsupported format version: {0}")]
    UnsupportedVersion(u32),

    /// Header-level corruption: non-zero reserved region, tables that do not
    /// fit the stream, missing root folder
    #[error("corrupt header: {reason}")]
    CorruptHeader {
        /// What check failed
        reason: String,
    },

    /// Table-level corruption: bad file-entry marker byte, invalid folder
    /// links, name offsets outside the blob
    #[error("corrupt table entry: {reason}")]
    CorruptEntry {
        /// What check failed
        reason: String,
    },

    /// Caller-side precondition failure: non-empty or unseekable write
    /// destination, extraction target that cannot hold the declared size
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// Chunk codec failure during extraction or writing
    #[error("chunk codec error: {0}")]
    Chunk(#[from] ChunkError),

    /// Binary read/write error
    #[error("binary format error: {0}")]
    BinRw(#[from] binrw::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
