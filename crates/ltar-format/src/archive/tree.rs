//! Hierarchy reconstruction from the flat folder table
//!
//! The on-disk folder table is an adjacency list: each entry names its first
//! child and next sibling by index. File attribution depends on the global
//! file list ordering invariant — a folder's own files appear contiguously,
//! immediately before its first child's entire subtree — so reconstruction
//! walks folders depth-first, consuming `file_count` consecutive entries from
//! the global list at each folder visited.
//!
//! The result is an arena of index-addressed nodes (indices match the folder
//! table), not a pointer graph.

use std::ops::Range;

use super::entry::FolderEntry;
use super::error::{ArchiveError, ArchiveResult};

/// One reconstructed folder
#[derive(Debug, Clone)]
pub struct FolderNode {
    /// Folder name (empty for the root)
    pub name: String,
    /// Full path from the root, separator-joined (empty for the root)
    pub path: String,
    /// Parent folder index, `None` for the root
    pub parent: Option<usize>,
    /// Child folder indices in sibling order
    pub children: Vec<usize>,
    /// The contiguous range of global file indices belonging to this folder
    pub files: Range<usize>,
}

/// Navigable folder hierarchy, index-aligned with the folder table
#[derive(Debug)]
pub struct FolderTree {
    nodes: Vec<FolderNode>,
}

impl FolderTree {
    /// Rebuild the hierarchy from the flat tables
    ///
    /// `file_total` is the global file count; `name_at` resolves name-blob
    /// offsets. Validates that the entries form a single-rooted forest with
    /// no cycles and that the file ranges exactly partition the global list.
    pub fn reconstruct<F>(
        folders: &[FolderEntry],
        file_total: usize,
        mut name_at: F,
    ) -> ArchiveResult<Self>
    where
        F: FnMut(u32) -> ArchiveResult<String>,
    {
        if folders.is_empty() {
            return Err(ArchiveError::CorruptHeader {
                reason: "missing root folder".to_owned(),
            });
        }

        let mut nodes: Vec<Option<FolderNode>> = folders.iter().map(|_| None).collect();
        let mut cursor = 0usize;
        // Pre-order stack of (folder index, parent index).
        let mut stack: Vec<(usize, Option<usize>)> = vec![(0, None)];

        while let Some((index, parent)) = stack.pop() {
            if nodes[index].is_some() {
                return Err(ArchiveError::CorruptEntry {
                    reason: format!("folder {index} reachable more than once"),
                });
            }
            let entry = &folders[index];

            let name = name_at(entry.name_offset)?;
            if index == 0 && !name.is_empty() {
                return Err(ArchiveError::CorruptEntry {
                    reason: format!("root folder has non-empty name {name:?}"),
                });
            }
            let path = match parent {
                Some(p) => {
                    // Parents are always visited before their children.
                    let parent_path = nodes[p].as_ref().map(|n| n.path.as_str()).unwrap_or("");
                    if parent_path.is_empty() {
                        name.clone()
                    } else {
                        format!("{parent_path}/{name}")
                    }
                }
                None => String::new(),
            };

            let file_count = entry.file_count as usize;
            if file_total - cursor < file_count {
                return Err(ArchiveError::CorruptEntry {
                    reason: format!(
                        "folder {index} claims {file_count} files but only {} remain",
                        file_total - cursor
                    ),
                });
            }
            let files = cursor..cursor + file_count;
            cursor += file_count;

            let children = child_chain(folders, index)?;
            // Reversed so the first child is popped (and its subtree consumed)
            // before the next sibling.
            for &child in children.iter().rev() {
                stack.push((child, Some(index)));
            }

            nodes[index] = Some(FolderNode {
                name,
                path,
                parent,
                children,
                files,
            });
        }

        if cursor != file_total {
            return Err(ArchiveError::CorruptEntry {
                reason: format!("{} of {file_total} files attributed to folders", cursor),
            });
        }

        let nodes = nodes
            .into_iter()
            .enumerate()
            .map(|(i, n)| {
                n.ok_or_else(|| ArchiveError::CorruptEntry {
                    reason: format!("folder {i} unreachable from the root"),
                })
            })
            .collect::<ArchiveResult<Vec<_>>>()?;

        Ok(Self { nodes })
    }

    /// All folders, index-aligned with the folder table
    pub fn nodes(&self) -> &[FolderNode] {
        &self.nodes
    }

    /// The folder at a table index
    pub fn get(&self, index: usize) -> Option<&FolderNode> {
        self.nodes.get(index)
    }

    /// The root folder
    pub fn root(&self) -> &FolderNode {
        &self.nodes[0]
    }

    /// Number of folders
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree is empty (never true for a valid archive)
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Folders in depth-first pre-order, the on-disk emission order
    pub fn walk(&self) -> impl Iterator<Item = &FolderNode> {
        self.nodes.iter()
    }
}

/// Collect the ordered children of `index` by following child/sibling links
fn child_chain(folders: &[FolderEntry], index: usize) -> ArchiveResult<Vec<usize>> {
    let mut children = Vec::new();
    let mut link = folders[index].child_index;
    while link >= 0 {
        let child = link as usize;
        if child >= folders.len() {
            return Err(ArchiveError::CorruptEntry {
                reason: format!("folder {index} links to out-of-range folder {child}"),
            });
        }
        if children.len() >= folders.len() {
            return Err(ArchiveError::CorruptEntry {
                reason: format!("sibling chain of folder {index} does not terminate"),
            });
        }
        children.push(child);
        link = folders[child].sibling_index;
    }
    Ok(children)
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    fn names(pairs: &[(u32, &str)]) -> impl FnMut(u32) -> ArchiveResult<String> {
        let owned: Vec<(u32, String)> =
            pairs.iter().map(|(o, n)| (*o, (*n).to_owned())).collect();
        move |offset| {
            owned
                .iter()
                .find(|(o, _)| *o == offset)
                .map(|(_, n)| n.clone())
                .ok_or_else(|| ArchiveError::CorruptEntry {
                    reason: format!("name offset {offset} out of range"),
                })
        }
    }

    fn folder(name_offset: u32, child: i32, sibling: i32, file_count: u32) -> FolderEntry {
        FolderEntry {
            name_offset,
            child_index: child,
            sibling_index: sibling,
            file_count,
        }
    }

    #[test]
    fn reconstructs_nested_folders() {
        // root(1 file) -> a(2 files), b(0 files); a -> a/c(1 file)
        let folders = vec![
            folder(0, 1, -1, 1),
            folder(1, 2, 3, 2),
            folder(3, -1, -1, 1),
            folder(5, -1, -1, 0),
        ];
        let tree = FolderTree::reconstruct(
            &folders,
            4,
            names(&[(0, ""), (1, "a"), (3, "c"), (5, "b")]),
        )
        .expect("reconstruct should succeed");

        assert_eq!(tree.len(), 4);
        assert_eq!(tree.root().files, 0..1);
        assert_eq!(tree.root().children, vec![1, 3]);

        let a = tree.get(1).expect("folder a");
        assert_eq!(a.path, "a");
        assert_eq!(a.files, 1..3);
        assert_eq!(a.children, vec![2]);

        let c = tree.get(2).expect("folder c");
        assert_eq!(c.path, "a/c");
        assert_eq!(c.parent, Some(1));
        assert_eq!(c.files, 3..4);

        let b = tree.get(3).expect("folder b");
        assert_eq!(b.path, "b");
        assert_eq!(b.files, 4..4);
    }

    #[test]
    fn cycle_is_rejected() {
        let folders = vec![folder(0, 1, -1, 0), folder(1, 0, -1, 0)];
        let err = FolderTree::reconstruct(&folders, 0, names(&[(0, ""), (1, "a")]))
            .expect_err("cycle must be rejected");
        assert!(matches!(err, ArchiveError::CorruptEntry { .. }));
    }

    #[test]
    fn unreachable_folder_is_rejected() {
        let folders = vec![folder(0, -1, -1, 0), folder(1, -1, -1, 0)];
        let err = FolderTree::reconstruct(&folders, 0, names(&[(0, ""), (1, "a")]))
            .expect_err("orphan must be rejected");
        assert!(matches!(err, ArchiveError::CorruptEntry { .. }));
    }

    #[test]
    fn file_counts_must_cover_global_list() {
        let folders = vec![folder(0, -1, -1, 2)];
        let err = FolderTree::reconstruct(&folders, 1, names(&[(0, "")]))
            .expect_err("overrun must be rejected");
        assert!(matches!(err, ArchiveError::CorruptEntry { .. }));

        let folders = vec![folder(0, -1, -1, 1)];
        let err = FolderTree::reconstruct(&folders, 2, names(&[(0, "")]))
            .expect_err("unattributed files must be rejected");
        assert!(matches!(err, ArchiveError::CorruptEntry { .. }));
    }

    #[test]
    fn empty_folder_table_is_corrupt() {
        let err = FolderTree::reconstruct(&[], 0, names(&[]))
            .expect_err("missing root must be rejected");
        assert!(matches!(err, ArchiveError::CorruptHeader { .. }));
    }
}
