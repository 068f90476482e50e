//! Archive header codec
//!
//! Every archive starts with a fixed 48-byte header. The magic marker doubles
//! as the byte-order selector: `LTAR` archives store all multi-byte fields
//! little-endian, `RATL` archives big-endian. The final 24 bytes are reserved
//! and must be zero; anything else is treated as corruption.

use binrw::io::{Read, Seek, Write};
use binrw::{BinRead, BinWrite, Endian};

use super::error::{ArchiveError, ArchiveResult};
use super::version::Version;

/// Magic marker of a little-endian archive
pub const MAGIC_LE: [u8; 4] = *b"LTAR";

/// Magic marker of a big-endian archive
pub const MAGIC_BE: [u8; 4] = *b"RATL";

/// Total header size in bytes
pub const HEADER_LEN: u64 = 48;

const RESERVED_LEN: usize = 24;

/// Map a magic marker to the byte order it selects
pub fn endian_for(magic: [u8; 4]) -> Option<Endian> {
    match magic {
        MAGIC_LE => Some(Endian::Little),
        MAGIC_BE => Some(Endian::Big),
        _ => None,
    }
}

/// The magic marker written for a byte order
pub fn magic_for(endian: Endian) -> [u8; 4] {
    match endian {
        Endian::Little => MAGIC_LE,
        Endian::Big => MAGIC_BE,
    }
}

/// Parsed 48-byte archive header
#[derive(Debug, Clone, Copy)]
pub struct ArchiveHeader {
    /// Format version
    pub version: Version,
    /// Name blob size in bytes
    pub name_blob_len: u32,
    /// Number of folder table entries
    pub folder_count: u32,
    /// Number of file table entries
    pub file_count: u32,
    /// Unknown field, observed constant 1; preserved but not interpreted
    pub unknown: u32,
}

impl ArchiveHeader {
    /// Read and validate a header, returning it with the byte order the
    /// magic selected
    pub fn read_from<R: Read + Seek>(reader: &mut R) -> ArchiveResult<(Self, Endian)> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        let endian = endian_for(magic).ok_or(ArchiveError::FormatMismatch { magic })?;

        let raw_version = u32::read_options(reader, endian, ())?;
        let version = Version::from_u32(raw_version)
            .ok_or(ArchiveError::UnsupportedVersion(raw_version))?;

        let name_blob_len = u32::read_options(reader, endian, ())?;
        let folder_count = u32::read_options(reader, endian, ())?;
        let file_count = u32::read_options(reader, endian, ())?;
        let unknown = u32::read_options(reader, endian, ())?;

        let mut reserved = [0u8; RESERVED_LEN];
        reader.read_exact(&mut reserved)?;
        if reserved.iter().any(|&b| b != 0) {
            return Err(ArchiveError::CorruptHeader {
                reason: "non-zero reserved region".to_owned(),
            });
        }

        Ok((
            Self {
                version,
                name_blob_len,
                folder_count,
                file_count,
                unknown,
            },
            endian,
        ))
    }

    /// Write the header in the given byte order
    pub fn write_to<W: Write + Seek>(&self, writer: &mut W, endian: Endian) -> ArchiveResult<()> {
        writer.write_all(&magic_for(endian))?;
        self.version.as_u32().write_options(writer, endian, ())?;
        self.name_blob_len.write_options(writer, endian, ())?;
        self.folder_count.write_options(writer, endian, ())?;
        self.file_count.write_options(writer, endian, ())?;
        self.unknown.write_options(writer, endian, ())?;
        writer.write_all(&[0u8; RESERVED_LEN])?;
        Ok(())
    }
}
