//! Flat file and folder table records
//!
//! Both tables are fixed-width arrays indexed by position. Folder entries
//! encode the hierarchy as an adjacency list (first-child and next-sibling
//! indices, −1 meaning none); file entries carry the offsets and sizes the
//! writer back-patches once chunk data has been written.

use binrw::io::{Read, Seek, Write};
use binrw::{BinRead, BinWrite, Endian};

use super::error::{ArchiveError, ArchiveResult};
use super::version::Version;

/// Version 4 file entries carry this constant before the flags byte
pub const FILE_ENTRY_MARKER: u8 = 1;

/// One file table record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileEntry {
    /// Name offset into the name blob
    pub name_offset: u32,
    /// Absolute offset of this file's first chunk record
    pub data_offset: u32,
    /// Stored byte count: chunk headers, payloads, and padding
    pub stored_size: u32,
    /// Original (decompressed) byte count
    pub original_size: u32,
    /// Entry flags; version 4 stores only the low byte
    pub flags: u32,
}

impl FileEntry {
    /// Read one entry in the given version's layout
    pub fn read_from<R: Read + Seek>(
        reader: &mut R,
        endian: Endian,
        version: Version,
    ) -> ArchiveResult<Self> {
        let name_offset = u32::read_options(reader, endian, ())?;
        let data_offset = u32::read_options(reader, endian, ())?;
        let stored_size = u32::read_options(reader, endian, ())?;
        let original_size = u32::read_options(reader, endian, ())?;
        let flags = match version {
            Version::V3 => u32::read_options(reader, endian, ())?,
            Version::V4 => {
                let marker = u8::read_options(reader, endian, ())?;
                if marker != FILE_ENTRY_MARKER {
                    return Err(ArchiveError::CorruptEntry {
                        reason: format!(
                            "file entry marker byte {marker}, expected {FILE_ENTRY_MARKER}"
                        ),
                    });
                }
                u32::from(u8::read_options(reader, endian, ())?)
            }
        };

        Ok(Self {
            name_offset,
            data_offset,
            stored_size,
            original_size,
            flags,
        })
    }

    /// Write one entry in the given version's layout
    pub fn write_to<W: Write + Seek>(
        &self,
        writer: &mut W,
        endian: Endian,
        version: Version,
    ) -> ArchiveResult<()> {
        self.name_offset.write_options(writer, endian, ())?;
        self.data_offset.write_options(writer, endian, ())?;
        self.stored_size.write_options(writer, endian, ())?;
        self.original_size.write_options(writer, endian, ())?;
        match version {
            Version::V3 => self.flags.write_options(writer, endian, ())?,
            Version::V4 => {
                FILE_ENTRY_MARKER.write_options(writer, endian, ())?;
                (self.flags as u8).write_options(writer, endian, ())?;
            }
        }
        Ok(())
    }
}

/// One folder table record
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
pub struct FolderEntry {
    /// Name offset into the name blob
    pub name_offset: u32,
    /// Index of the first child folder, −1 if none
    pub child_index: i32,
    /// Index of the next sibling folder, −1 if last among siblings
    pub sibling_index: i32,
    /// Files belonging directly to this folder
    pub file_count: u32,
}

impl FolderEntry {
    /// Whether this folder has child folders
    pub fn has_children(&self) -> bool {
        self.child_index >= 0
    }
}
