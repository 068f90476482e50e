//! Name table handling
//!
//! Every folder and file name in an archive lives in a single deduplicated
//! blob of null-terminated UTF-8 strings directly after the header. Entries
//! reference names by byte offset relative to the blob start. [`NameTable`]
//! builds the blob on the write path; [`NameBlob`] resolves offsets lazily on
//! the read path.

use std::collections::HashMap;

use crate::path;

/// Write-side name interner
///
/// The first occurrence of a normalized name claims a blob offset; later
/// occurrences of the identical string reuse it. Version 3 archives pad each
/// name to the next 4-byte boundary, controlled by `pad_names`.
#[derive(Debug)]
pub struct NameTable {
    blob: Vec<u8>,
    offsets: HashMap<String, u32>,
    pad_names: bool,
}

impl NameTable {
    /// Create an empty table
    ///
    /// `pad_names` selects the version 3 layout where every name is padded to
    /// a 4-byte boundary within the blob.
    pub fn new(pad_names: bool) -> Self {
        Self {
            blob: Vec::new(),
            offsets: HashMap::new(),
            pad_names,
        }
    }

    /// Intern a name, returning its blob offset and whether it was new
    ///
    /// Names are normalized (canonical separators, no leading or trailing
    /// separator) before lookup, so identical names always share one entry.
    pub fn intern(&mut self, name: &str) -> (u32, bool) {
        let name = path::normalize(name);
        if let Some(&offset) = self.offsets.get(&name) {
            return (offset, false);
        }
        let offset = self.blob.len() as u32;
        self.blob.extend_from_slice(name.as_bytes());
        self.blob.push(0);
        if self.pad_names {
            while self.blob.len() % 4 != 0 {
                self.blob.push(0);
            }
        }
        self.offsets.insert(name, offset);
        (offset, true)
    }

    /// Total blob size in bytes
    pub fn len(&self) -> u32 {
        self.blob.len() as u32
    }

    /// Whether no name has been interned yet
    pub fn is_empty(&self) -> bool {
        self.blob.is_empty()
    }

    /// The raw blob bytes in on-disk form
    pub fn as_bytes(&self) -> &[u8] {
        &self.blob
    }
}

/// Read-side name blob
///
/// Holds the raw blob bytes from an archive. Individual names are resolved
/// on demand; nothing is decoded up front.
#[derive(Debug)]
pub struct NameBlob {
    bytes: Box<[u8]>,
}

impl NameBlob {
    /// Wrap raw blob bytes read from an archive
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: bytes.into_boxed_slice(),
        }
    }

    /// Resolve the name at a byte offset
    ///
    /// Returns `None` when the offset is out of range, the name is not
    /// null-terminated within the blob, or the bytes are not valid UTF-8.
    pub fn name_at(&self, offset: u32) -> Option<&str> {
        let start = offset as usize;
        if start >= self.bytes.len() {
            return None;
        }
        let rest = &self.bytes[start..];
        let end = rest.iter().position(|&b| b == 0)?;
        std::str::from_utf8(&rest[..end]).ok()
    }

    /// Blob size in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the blob is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
