//! Two-pass archive writer
//!
//! Several on-disk fields must be written before their values are known: the
//! name-blob size, every file's data offset and sizes, and every folder's
//! next-sibling index. The writer uses a reserve-and-backfill discipline:
//! reserving a slot records the current stream position under a symbolic key
//! and advances the cursor past a placeholder; resolving seeks back,
//! overwrites exactly that field, and returns to the write cursor. Any number
//! of reservations may be open at once.
//!
//! Fixed write order: header (blob size reserved), name blob, file table
//! (offset and sizes reserved per entry), folder table (sibling index
//! reserved per entry), the version 4 filler block, then chunked file data in
//! file-table order.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Seek, SeekFrom, Write};

use binrw::{BinWrite, Endian};
use tracing::{debug, trace};

use crate::chunk::ChunkEncoder;
use crate::names::NameTable;
use crate::staging::{FileSource, StagedFile, StagingNode, StagingTree};

use super::error::{ArchiveError, ArchiveResult};
use super::header::magic_for;
use super::version::Version;

/// Options controlling how an archive is written
#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    /// Target format version
    pub version: Version,
    /// Byte order (selects the magic marker)
    pub endian: Endian,
    /// Compression level for the version 4 backend; ignored by version 3
    pub level: i32,
}

impl WriteOptions {
    /// Options for the given version with little-endian byte order and the
    /// backend's default level
    pub fn new(version: Version) -> Self {
        Self {
            version,
            endian: Endian::Little,
            level: zstd::DEFAULT_COMPRESSION_LEVEL,
        }
    }

    /// Select the byte order
    pub fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    /// Select the version 4 compression level
    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }
}

/// Symbolic key for a reserved field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Slot {
    /// Name-blob byte size in the header
    NameBlobLen,
    /// A file's data start offset, by file table index
    FileDataOffset(u32),
    /// A file's stored size, by file table index
    FileStoredSize(u32),
    /// A file's original size, by file table index
    FileOriginalSize(u32),
    /// A folder's next-sibling index, by folder table index
    FolderSibling(u32),
}

/// Serializes a staging tree into the container format
pub struct ArchiveWriter<W: Write + Seek> {
    writer: W,
    version: Version,
    endian: Endian,
    level: i32,
    reservations: HashMap<Slot, u64>,
}

/// Write a staged tree to `dest`, returning the destination on success
///
/// The destination must be empty and seekable; anything else is a
/// precondition violation, not retried.
pub fn write_archive<W: Write + Seek>(
    tree: &StagingTree,
    dest: W,
    options: &WriteOptions,
) -> ArchiveResult<W> {
    let mut writer = ArchiveWriter::new(dest, options)?;
    writer.write(tree)?;
    writer.finish()
}

struct FilePlan<'a> {
    name_offset: u32,
    file: &'a StagedFile,
}

impl<W: Write + Seek> ArchiveWriter<W> {
    /// Wrap a destination, verifying it is empty and at its start
    pub fn new(mut dest: W, options: &WriteOptions) -> ArchiveResult<Self> {
        let len = dest.seek(SeekFrom::End(0))?;
        if len != 0 {
            return Err(ArchiveError::Precondition(format!(
                "write destination is not empty ({len} bytes)"
            )));
        }
        dest.seek(SeekFrom::Start(0))?;
        Ok(Self {
            writer: dest,
            version: options.version,
            endian: options.endian,
            level: options.level,
            reservations: HashMap::new(),
        })
    }

    /// Serialize the whole staging tree
    pub fn write(&mut self, tree: &StagingTree) -> ArchiveResult<()> {
        let folder_count = tree.folder_count();
        let file_count = tree.file_count();
        debug!(
            version = self.version.as_u32(),
            folders = folder_count,
            files = file_count,
            "writing archive"
        );

        // Header, with the blob size reserved.
        self.writer.write_all(&magic_for(self.endian))?;
        self.put_u32(self.version.as_u32())?;
        self.reserve(Slot::NameBlobLen)?;
        self.put_u32(folder_count)?;
        self.put_u32(file_count)?;
        self.put_u32(1)?;
        self.writer.write_all(&[0u8; 24])?;

        // Name blob: pre-order, each node's own name, then its files' names,
        // then children in insertion order. The same traversal yields the
        // file plans in the global-list order the tables require.
        let mut names = NameTable::new(self.version.pads_names());
        let mut folder_names = Vec::with_capacity(folder_count as usize);
        let mut files = Vec::with_capacity(file_count as usize);
        collect_names(tree.root(), &mut names, &mut folder_names, &mut files);

        self.writer.write_all(names.as_bytes())?;
        self.resolve_u32(Slot::NameBlobLen, names.len())?;

        // File table. Offset and sizes resolve after the chunk data phase.
        for (index, plan) in files.iter().enumerate() {
            let index = index as u32;
            self.put_u32(plan.name_offset)?;
            self.reserve(Slot::FileDataOffset(index))?;
            self.reserve(Slot::FileStoredSize(index))?;
            self.reserve(Slot::FileOriginalSize(index))?;
            match self.version {
                Version::V3 => self.put_u32(plan.file.flags)?,
                Version::V4 => {
                    self.writer
                        .write_all(&[super::entry::FILE_ENTRY_MARKER, plan.file.flags as u8])?;
                }
            }
        }

        // Folder table: pre-order DFS. The root has no sibling.
        let mut next_index = 0u32;
        self.write_folder_subtree(tree.root(), &folder_names, &mut next_index)?;
        self.resolve_i32(Slot::FolderSibling(0), -1)?;

        // Version 4 carries a filler block before the chunk data.
        let mut filler = self.version.filler_len(file_count);
        let zeros = [0u8; 4096];
        while filler > 0 {
            let n = filler.min(zeros.len() as u64) as usize;
            self.writer.write_all(&zeros[..n])?;
            filler -= n as u64;
        }

        // Chunk data, in file-table order. Each file's reserved fields
        // resolve as soon as its data is on disk.
        let mut encoder = ChunkEncoder::new(self.version.codec(self.level), self.endian);
        for (index, plan) in files.iter().enumerate() {
            let index = index as u32;
            let data_offset = self.writer.stream_position()?;
            let (stored, original) = match &plan.file.source {
                FileSource::Bytes(bytes) => {
                    encoder.encode_file(&mut Cursor::new(bytes.as_slice()), &mut self.writer)?
                }
                FileSource::Disk(path) => {
                    let mut file = File::open(path)?;
                    encoder.encode_file(&mut file, &mut self.writer)?
                }
            };
            trace!(name = %plan.file.name, stored, original, "file data written");

            self.resolve_u32(Slot::FileDataOffset(index), narrow(data_offset, "data offset")?)?;
            self.resolve_u32(Slot::FileStoredSize(index), narrow(stored, "stored size")?)?;
            self.resolve_u32(
                Slot::FileOriginalSize(index),
                narrow(original, "original size")?,
            )?;
        }

        Ok(())
    }

    /// Flush and return the destination
    pub fn finish(mut self) -> ArchiveResult<W> {
        debug_assert!(
            self.reservations.is_empty(),
            "unresolved reservations: {:?}",
            self.reservations
        );
        let end = self.writer.stream_position()?;
        self.writer.flush()?;
        debug!(bytes = end, "archive written");
        Ok(self.writer)
    }

    /// Emit `node`'s folder record, then its children's subtrees
    ///
    /// A folder's sibling index resolves only once its entire subtree has
    /// been written: −1 for the last sibling, otherwise the index the next
    /// folder write is about to claim.
    fn write_folder_subtree(
        &mut self,
        node: &StagingNode,
        folder_names: &[u32],
        next_index: &mut u32,
    ) -> ArchiveResult<()> {
        let index = *next_index;
        *next_index += 1;

        self.put_u32(folder_names[index as usize])?;
        // The first child, if any, is the very next folder written.
        let child_index = if node.children.is_empty() {
            -1
        } else {
            (index + 1) as i32
        };
        self.put_i32(child_index)?;
        self.reserve(Slot::FolderSibling(index))?;
        self.put_u32(node.files.len() as u32)?;

        let child_total = node.children.len();
        for (position, child) in node.children.iter().enumerate() {
            let child_index = *next_index;
            self.write_folder_subtree(child, folder_names, next_index)?;
            let sibling = if position + 1 == child_total {
                -1
            } else {
                *next_index as i32
            };
            self.resolve_i32(Slot::FolderSibling(child_index), sibling)?;
        }
        Ok(())
    }

    /// Record the current position under `slot` and advance past a
    /// placeholder field
    fn reserve(&mut self, slot: Slot) -> ArchiveResult<()> {
        let position = self.writer.stream_position()?;
        if self.reservations.insert(slot, position).is_some() {
            return Err(ArchiveError::Precondition(format!(
                "slot {slot:?} reserved twice"
            )));
        }
        self.put_u32(0)
    }

    /// Overwrite a reserved field and return to the write cursor
    fn resolve_u32(&mut self, slot: Slot, value: u32) -> ArchiveResult<()> {
        let position = self.reservations.remove(&slot).ok_or_else(|| {
            ArchiveError::Precondition(format!("slot {slot:?} resolved without reservation"))
        })?;
        let cursor = self.writer.stream_position()?;
        self.writer.seek(SeekFrom::Start(position))?;
        self.put_u32(value)?;
        self.writer.seek(SeekFrom::Start(cursor))?;
        Ok(())
    }

    fn resolve_i32(&mut self, slot: Slot, value: i32) -> ArchiveResult<()> {
        self.resolve_u32(slot, value as u32)
    }

    fn put_u32(&mut self, value: u32) -> ArchiveResult<()> {
        value.write_options(&mut self.writer, self.endian, ())?;
        Ok(())
    }

    fn put_i32(&mut self, value: i32) -> ArchiveResult<()> {
        value.write_options(&mut self.writer, self.endian, ())?;
        Ok(())
    }
}

fn narrow(value: u64, what: &str) -> ArchiveResult<u32> {
    u32::try_from(value).map_err(|_| {
        ArchiveError::Precondition(format!("{what} {value} exceeds the 32-bit field range"))
    })
}

fn collect_names<'a>(
    node: &'a StagingNode,
    names: &mut NameTable,
    folder_names: &mut Vec<u32>,
    files: &mut Vec<FilePlan<'a>>,
) {
    let (offset, _) = names.intern(&node.name);
    folder_names.push(offset);
    for file in &node.files {
        let (name_offset, _) = names.intern(&file.name);
        files.push(FilePlan { name_offset, file });
    }
    for child in &node.children {
        collect_names(child, names, folder_names, files);
    }
}
