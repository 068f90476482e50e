//! Archive reading and extraction
//!
//! [`Archive`] parses the header and tables eagerly and keeps the name blob
//! in memory as raw bytes; individual names are resolved on demand. File
//! data stays on the underlying stream until an extraction asks for it.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

use binrw::{BinRead, Endian};
use tracing::{debug, trace};

use crate::chunk::ChunkDecoder;
use crate::names::NameBlob;

use super::entry::{FileEntry, FolderEntry};
use super::error::{ArchiveError, ArchiveResult};
use super::header::{ArchiveHeader, HEADER_LEN};
use super::tree::FolderTree;
use super::version::{FOLDER_ENTRY_LEN, Version};

/// A parsed archive over a seekable stream
#[derive(Debug)]
pub struct Archive<R: Read + Seek> {
    reader: R,
    endian: Endian,
    header: ArchiveHeader,
    names: NameBlob,
    files: Vec<FileEntry>,
    folders: Vec<FolderEntry>,
    data_start: u64,
    decoder: ChunkDecoder,
}

impl Archive<BufReader<File>> {
    /// Open an archive file from disk
    pub fn open<P: AsRef<Path>>(path: P) -> ArchiveResult<Self> {
        let file = File::open(path)?;
        Self::from_stream(BufReader::new(file))
    }
}

impl<R: Read + Seek> Archive<R> {
    /// Parse the header and tables from a stream positioned at the start
    pub fn from_stream(mut reader: R) -> ArchiveResult<Self> {
        let (header, endian) = ArchiveHeader::read_from(&mut reader)?;
        if header.folder_count == 0 {
            return Err(ArchiveError::CorruptHeader {
                reason: "folder count is zero; the root folder is mandatory".into(),
            });
        }

        // The declared tables must fit the stream before any count-driven
        // allocation happens; header counts are untrusted input.
        let stream_len = reader.seek(SeekFrom::End(0))?;
        let tables_len = u64::from(header.name_blob_len)
            + u64::from(header.file_count) * header.version.file_entry_len()
            + u64::from(header.folder_count) * FOLDER_ENTRY_LEN
            + header.version.filler_len(header.file_count);
        if HEADER_LEN + tables_len > stream_len {
            return Err(ArchiveError::CorruptHeader {
                reason: format!(
                    "header declares {tables_len} table bytes but the stream \
                     holds {stream_len}"
                ),
            });
        }
        reader.seek(SeekFrom::Start(HEADER_LEN))?;

        let mut blob = vec![0u8; header.name_blob_len as usize];
        reader.read_exact(&mut blob)?;
        let names = NameBlob::new(blob);

        let mut files = Vec::with_capacity(header.file_count as usize);
        for _ in 0..header.file_count {
            files.push(FileEntry::read_from(&mut reader, endian, header.version)?);
        }
        let mut folders = Vec::with_capacity(header.folder_count as usize);
        for _ in 0..header.folder_count {
            folders.push(FolderEntry::read_options(&mut reader, endian, ())?);
        }

        let filler = header.version.filler_len(header.file_count);
        let data_start = reader.seek(SeekFrom::Current(filler as i64))?;

        for (index, entry) in files.iter().enumerate() {
            let start = u64::from(entry.data_offset);
            let end = start + u64::from(entry.stored_size);
            if start < data_start || end > stream_len {
                return Err(ArchiveError::CorruptEntry {
                    reason: format!(
                        "file {index} data range {start}..{end} is outside \
                         the data region {data_start}..{stream_len}"
                    ),
                });
            }
        }

        debug!(
            version = header.version.as_u32(),
            folders = header.folder_count,
            files = header.file_count,
            data_start,
            "archive opened"
        );

        let decoder = ChunkDecoder::new(
            header.version.codec(zstd::DEFAULT_COMPRESSION_LEVEL),
            endian,
        );

        Ok(Self {
            reader,
            endian,
            header,
            names,
            files,
            folders,
            data_start,
            decoder,
        })
    }

    /// Format version of this archive
    pub fn version(&self) -> Version {
        self.header.version
    }

    /// Byte order of this archive
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Parsed header fields
    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    /// File table, in on-disk order
    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    /// Folder table, in on-disk order
    pub fn folders(&self) -> &[FolderEntry] {
        &self.folders
    }

    /// Resolve a name-blob offset to the string stored there
    pub fn name_at(&self, offset: u32) -> ArchiveResult<&str> {
        self.names.name_at(offset).ok_or_else(|| ArchiveError::CorruptEntry {
            reason: format!("name offset {offset} is not a valid blob string"),
        })
    }

    /// Rebuild the folder hierarchy from the flat adjacency table
    pub fn folder_tree(&self) -> ArchiveResult<FolderTree> {
        let names = &self.names;
        FolderTree::reconstruct(&self.folders, self.files.len(), |offset| {
            names
                .name_at(offset)
                .map(ToOwned::to_owned)
                .ok_or_else(|| ArchiveError::CorruptEntry {
                    reason: format!("folder name offset {offset} is not a valid blob string"),
                })
        })
    }

    /// Full archive paths of every file, in file-table order
    pub fn file_paths(&self) -> ArchiveResult<Vec<String>> {
        let tree = self.folder_tree()?;
        let mut paths = vec![String::new(); self.files.len()];
        for node in tree.walk() {
            for index in node.files.clone() {
                let name = self.name_at(self.files[index].name_offset)?;
                paths[index] = if node.path.is_empty() {
                    name.to_owned()
                } else {
                    format!("{}/{name}", node.path)
                };
            }
        }
        Ok(paths)
    }

    /// Decompress one file's data into `sink`
    ///
    /// Each file decodes independently; corruption inside one file's chunk
    /// records never affects the others.
    pub fn extract_to_writer<W: Write>(
        &mut self,
        index: usize,
        sink: &mut W,
    ) -> ArchiveResult<()> {
        let entry = *self.files.get(index).ok_or_else(|| {
            ArchiveError::Precondition(format!(
                "file index {index} out of range ({} files)",
                self.files.len()
            ))
        })?;
        trace!(
            index,
            stored = entry.stored_size,
            original = entry.original_size,
            "extracting file"
        );

        self.reader.seek(SeekFrom::Start(u64::from(entry.data_offset)))?;
        let region_offset = u64::from(entry.data_offset) - self.data_start;
        self.decoder.decode_file(
            &mut self.reader,
            sink,
            u64::from(entry.original_size),
            region_offset,
        )?;
        Ok(())
    }

    /// Decompress one file's data into a caller-provided buffer
    ///
    /// Rejected up front when the buffer cannot hold the entry's declared
    /// original size. Returns the number of bytes written.
    pub fn extract_into(&mut self, index: usize, dest: &mut [u8]) -> ArchiveResult<usize> {
        if let Some(entry) = self.files.get(index) {
            let declared = entry.original_size as usize;
            if dest.len() < declared {
                return Err(ArchiveError::Precondition(format!(
                    "destination buffer of {} bytes cannot hold the declared \
                     {declared}",
                    dest.len()
                )));
            }
        }
        let mut cursor = std::io::Cursor::new(dest);
        self.extract_to_writer(index, &mut cursor)?;
        Ok(cursor.position() as usize)
    }

    /// Decompress one file's data into a fresh buffer
    pub fn extract_to_vec(&mut self, index: usize) -> ArchiveResult<Vec<u8>> {
        let capacity = self
            .files
            .get(index)
            .map(|entry| entry.original_size as usize)
            .unwrap_or(0);
        let mut out = Vec::with_capacity(capacity);
        self.extract_to_writer(index, &mut out)?;
        Ok(out)
    }

    /// Consume the archive, returning the underlying stream
    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn rejects_zero_folder_count() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"LTAR");
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes()); // name blob
        bytes.extend_from_slice(&0u32.to_le_bytes()); // folders
        bytes.extend_from_slice(&0u32.to_le_bytes()); // files
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 24]);

        let err = Archive::from_stream(Cursor::new(bytes)).expect_err("must reject");
        assert!(matches!(err, ArchiveError::CorruptHeader { .. }));
    }

    #[test]
    fn rejects_file_data_past_stream_end() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"LTAR");
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.extend_from_slice(&8u32.to_le_bytes()); // name blob
        bytes.extend_from_slice(&1u32.to_le_bytes()); // folders
        bytes.extend_from_slice(&1u32.to_le_bytes()); // files
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 24]);
        bytes.extend_from_slice(b"\0\0\0\0a.b\0"); // root name + file name
        // File entry claiming data far past the end of the stream.
        bytes.extend_from_slice(&4u32.to_le_bytes()); // name offset
        bytes.extend_from_slice(&100u32.to_le_bytes()); // data offset
        bytes.extend_from_slice(&5000u32.to_le_bytes()); // stored
        bytes.extend_from_slice(&5000u32.to_le_bytes()); // original
        bytes.extend_from_slice(&0u32.to_le_bytes()); // flags
        // Root folder entry.
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&(-1i32).to_le_bytes());
        bytes.extend_from_slice(&(-1i32).to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());

        let err = Archive::from_stream(Cursor::new(bytes)).expect_err("must reject");
        assert!(matches!(err, ArchiveError::CorruptEntry { .. }));
    }

    #[test]
    fn oversized_header_counts_are_rejected_before_allocation() {
        // A 48-byte stream whose header claims a billion-entry file table
        // must fail the table-fit check, not attempt the allocation.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"LTAR");
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes()); // name blob
        bytes.extend_from_slice(&1u32.to_le_bytes()); // folders
        bytes.extend_from_slice(&0x4000_0000u32.to_le_bytes()); // files
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 24]);

        let err = Archive::from_stream(Cursor::new(bytes)).expect_err("must reject");
        assert!(matches!(err, ArchiveError::CorruptHeader { .. }));
    }

    #[test]
    fn oversized_name_blob_is_rejected_before_allocation() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RATL");
        bytes.extend_from_slice(&4u32.to_be_bytes());
        bytes.extend_from_slice(&u32::MAX.to_be_bytes()); // name blob
        bytes.extend_from_slice(&1u32.to_be_bytes()); // folders
        bytes.extend_from_slice(&0u32.to_be_bytes()); // files
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&[0u8; 24]);

        let err = Archive::from_stream(Cursor::new(bytes)).expect_err("must reject");
        assert!(matches!(err, ArchiveError::CorruptHeader { .. }));
    }

    #[test]
    fn archive_is_debug_formattable() {
        let tree = crate::staging::StagingTree::new();
        let mut out = crate::archive::write_archive(
            &tree,
            Cursor::new(Vec::new()),
            &crate::archive::WriteOptions::new(Version::V3),
        )
        .expect("write should succeed");
        out.seek(SeekFrom::Start(0)).expect("rewind");

        let archive = Archive::from_stream(out).expect("reopen should succeed");
        let rendered = format!("{archive:?}");
        assert!(rendered.contains("Archive"));
    }

    #[test]
    fn extract_rejects_out_of_range_index() {
        let tree = crate::staging::StagingTree::new();
        let mut out = crate::archive::write_archive(
            &tree,
            Cursor::new(Vec::new()),
            &crate::archive::WriteOptions::new(Version::V3),
        )
        .expect("write should succeed");
        out.seek(SeekFrom::Start(0)).expect("rewind");

        let mut archive = Archive::from_stream(out).expect("reopen should succeed");
        let err = archive
            .extract_to_writer(0, &mut Vec::new())
            .expect_err("must reject");
        assert!(matches!(err, ArchiveError::Precondition(_)));
    }
}
