//! Container-level reading and writing
//!
//! An archive is a single stream: 48-byte header, deduplicated name blob,
//! flat file table, flat folder adjacency table, a version 4 filler block,
//! then every file's chunked data. [`Archive`] parses and extracts;
//! [`ArchiveWriter`] serializes a [`crate::staging::StagingTree`] with the
//! reserve-and-backfill two-pass scheme.

mod entry;
mod error;
mod header;
mod reader;
mod tree;
mod version;
mod writer;

use std::io::{Read, Seek, SeekFrom};

use binrw::Endian;

pub use entry::{FILE_ENTRY_MARKER, FileEntry, FolderEntry};
pub use error::{ArchiveError, ArchiveResult};
pub use header::{ArchiveHeader, HEADER_LEN, MAGIC_BE, MAGIC_LE};
pub use reader::Archive;
pub use tree::{FolderNode, FolderTree};
pub use version::{FOLDER_ENTRY_LEN, Version};
pub use writer::{ArchiveWriter, WriteOptions, write_archive};

/// Probe a stream for the container magic and a supported version
///
/// Reads the first eight bytes and restores the stream position. Returns
/// `None` when the magic or version does not match; I/O errors propagate.
pub fn detect<R: Read + Seek>(reader: &mut R) -> ArchiveResult<Option<(Version, Endian)>> {
    let position = reader.stream_position()?;
    let mut probe = [0u8; 8];
    match reader.read_exact(&mut probe) {
        Ok(()) => {}
        // Too short to carry a header; anything else is a real I/O failure.
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            reader.seek(SeekFrom::Start(position))?;
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    }
    reader.seek(SeekFrom::Start(position))?;

    let mut magic = [0u8; 4];
    magic.copy_from_slice(&probe[..4]);
    let Some(endian) = header::endian_for(magic) else {
        return Ok(None);
    };
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&probe[4..8]);
    let raw_version = match endian {
        Endian::Little => u32::from_le_bytes(raw),
        Endian::Big => u32::from_be_bytes(raw),
    };
    Ok(Version::from_u32(raw_version).map(|version| (version, endian)))
}
