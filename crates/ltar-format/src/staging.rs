//! Staging tree for archive writing
//!
//! Callers stage files one path at a time; the tree builds the folder
//! hierarchy as paths are inserted, preserving insertion order for both files
//! and child folders. The staging tree exists only on the write path; the
//! on-disk representation is the flat folder table.

use std::path::{Path, PathBuf};

use crate::path;

/// Where a staged file's content comes from at write time
#[derive(Debug, Clone)]
pub enum FileSource {
    /// Read from the filesystem when the archive is written
    Disk(PathBuf),
    /// In-memory content
    Bytes(Vec<u8>),
}

/// A pending file record
#[derive(Debug, Clone)]
pub struct StagedFile {
    /// File name (final path segment)
    pub name: String,
    /// Flags stored in the file table entry
    pub flags: u32,
    /// Content source
    pub source: FileSource,
}

/// One folder in the staging hierarchy
#[derive(Debug)]
pub struct StagingNode {
    /// Own name (empty for the root)
    pub name: String,
    /// Full cumulative in-archive path (empty for the root)
    pub path: String,
    /// Files directly in this folder, in insertion order
    pub files: Vec<StagedFile>,
    /// Child folders, in insertion order
    pub children: Vec<StagingNode>,
}

impl StagingNode {
    fn new(name: String, path: String) -> Self {
        Self {
            name,
            path,
            files: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Number of files in this subtree
    pub fn file_count(&self) -> u32 {
        self.files.len() as u32 + self.children.iter().map(StagingNode::file_count).sum::<u32>()
    }

    /// Number of folders in this subtree, counting this node
    pub fn folder_count(&self) -> u32 {
        1 + self.children.iter().map(StagingNode::folder_count).sum::<u32>()
    }

    fn child_mut(&mut self, name: &str) -> Option<usize> {
        self.children.iter().position(|c| c.name == name)
    }
}

/// In-memory hierarchy of files pending archiving
#[derive(Debug)]
pub struct StagingTree {
    root: StagingNode,
}

impl Default for StagingTree {
    fn default() -> Self {
        Self::new()
    }
}

impl StagingTree {
    /// Create an empty tree (a lone root folder)
    pub fn new() -> Self {
        Self {
            root: StagingNode::new(String::new(), String::new()),
        }
    }

    /// Stage a file from disk
    ///
    /// The in-archive path is `file_path` normalized with `root_prefix`
    /// stripped; content is read when the archive is written. Staging the
    /// same in-archive path twice keeps the later record.
    pub fn mount<P: AsRef<Path>>(&mut self, root_prefix: &str, file_path: P, flags: u32) {
        let source_path = file_path.as_ref().to_path_buf();
        let normalized = path::normalize(&source_path.to_string_lossy());
        let archive_path = path::strip_prefix(&normalized, root_prefix).to_owned();
        self.insert(&archive_path, flags, FileSource::Disk(source_path));
    }

    /// Stage a file from in-memory bytes under an explicit in-archive path
    pub fn add_bytes(&mut self, archive_path: &str, flags: u32, bytes: Vec<u8>) {
        let archive_path = path::normalize(archive_path);
        self.insert(&archive_path, flags, FileSource::Bytes(bytes));
    }

    fn insert(&mut self, archive_path: &str, flags: u32, source: FileSource) {
        let segments: Vec<&str> = path::segments(archive_path).collect();
        let Some((file_name, folders)) = segments.split_last() else {
            return;
        };

        let mut node = &mut self.root;
        let mut cumulative = String::new();
        for segment in folders {
            if !cumulative.is_empty() {
                cumulative.push(path::SEPARATOR);
            }
            cumulative.push_str(segment);
            let index = match node.child_mut(segment) {
                Some(i) => i,
                None => {
                    node.children
                        .push(StagingNode::new((*segment).to_owned(), cumulative.clone()));
                    node.children.len() - 1
                }
            };
            node = &mut node.children[index];
        }

        let record = StagedFile {
            name: (*file_name).to_owned(),
            flags,
            source,
        };
        // Last write wins for duplicate paths.
        match node.files.iter_mut().find(|f| f.name == *file_name) {
            Some(existing) => *existing = record,
            None => node.files.push(record),
        }
    }

    /// The root folder
    pub fn root(&self) -> &StagingNode {
        &self.root
    }

    /// Total staged files
    pub fn file_count(&self) -> u32 {
        self.root.file_count()
    }

    /// Total folders including the root
    pub fn folder_count(&self) -> u32 {
        self.root.folder_count()
    }
}
