//! Reader and writer for the LTAR game-archive container format
//!
//! An LTAR archive packs a folder hierarchy of files into one stream:
//! a fixed 48-byte header, a deduplicated NUL-terminated name blob, flat
//! file and folder tables, and per-file chunked compressed data. Two
//! format versions are supported, differing in file-entry layout, name
//! padding, and compression backend (version 3 uses zlib, version 4
//! zstd). Either byte order is accepted; the magic marker (`LTAR` or
//! `RATL`) announces which one an archive uses.
//!
//! # Reading
//!
//! ```no_run
//! use ltar_format::archive::Archive;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut archive = Archive::open("assets.ltar")?;
//! for path in archive.file_paths()? {
//!     println!("{path}");
//! }
//! let data = archive.extract_to_vec(0)?;
//! # let _ = data;
//! # Ok(())
//! # }
//! ```
//!
//! # Writing
//!
//! ```no_run
//! use std::fs::File;
//! use ltar_format::archive::{Version, WriteOptions, write_archive};
//! use ltar_format::staging::StagingTree;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut tree = StagingTree::new();
//! tree.add_bytes("textures/grass.dds", 0, vec![0u8; 128]);
//! tree.mount("local", "local/sounds/theme.ogg", 0);
//! write_archive(&tree, File::create("assets.ltar")?, &WriteOptions::new(Version::V4))?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod archive;
pub mod chunk;
pub mod names;
pub mod path;
pub mod staging;

pub use archive::{Archive, ArchiveError, ArchiveResult, Version, WriteOptions, write_archive};
pub use staging::StagingTree;
