//! Chunked stream codec
//!
//! File data in an LTAR archive is stored as a sequence of independently
//! compressed chunks of at most [`MAX_CHUNK_SIZE`] original bytes. Each chunk
//! record is a compressed-size field, an original-size field, the payload,
//! and pad bytes aligning the running offset within the chunked data region
//! to a 4-byte boundary. There is no in-band end marker; decoding is bounded
//! by the original total declared in the file table.

mod compression;
mod error;

pub use compression::{ChunkCompressor, ZlibCodec, ZstdCodec};
pub use error::{ChunkError, ChunkResult};

use std::io::{Read, Write};

use binrw::Endian;

/// Maximum original bytes a single chunk may carry
pub const MAX_CHUNK_SIZE: usize = 65536;

/// Filler byte written into alignment padding
///
/// Carries no meaning; readers skip pad bytes without validating their value.
pub const PAD_BYTE: u8 = 0xCD;

fn write_u32<W: Write + ?Sized>(dst: &mut W, endian: Endian, value: u32) -> std::io::Result<()> {
    let bytes = match endian {
        Endian::Little => value.to_le_bytes(),
        Endian::Big => value.to_be_bytes(),
    };
    dst.write_all(&bytes)
}

fn read_u32<R: Read + ?Sized>(src: &mut R, endian: Endian) -> std::io::Result<u32> {
    let mut bytes = [0u8; 4];
    src.read_exact(&mut bytes)?;
    Ok(match endian {
        Endian::Little => u32::from_le_bytes(bytes),
        Endian::Big => u32::from_be_bytes(bytes),
    })
}

fn pad_len(region_offset: u64) -> u64 {
    (4 - region_offset % 4) % 4
}

/// Streaming chunk encoder
///
/// One encoder instance serves a whole archive write: it owns the running
/// region offset that alignment padding is measured against, plus a scratch
/// buffer bounded at [`MAX_CHUNK_SIZE`] reused for every chunk.
#[derive(Debug)]
pub struct ChunkEncoder {
    backend: Box<dyn ChunkCompressor>,
    endian: Endian,
    region_offset: u64,
    raw: Vec<u8>,
}

impl ChunkEncoder {
    /// Create an encoder over a version-selected backend
    pub fn new(backend: Box<dyn ChunkCompressor>, endian: Endian) -> Self {
        Self {
            backend,
            endian,
            region_offset: 0,
            raw: vec![0u8; MAX_CHUNK_SIZE],
        }
    }

    /// Encode one file's content from `src` into `dst`
    ///
    /// Returns `(stored, original)` byte totals, where `stored` covers chunk
    /// headers, payloads, and pad bytes. A zero-length source produces zero
    /// chunks and `(0, 0)`.
    pub fn encode_file<R, W>(&mut self, src: &mut R, dst: &mut W) -> ChunkResult<(u64, u64)>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        let mut stored: u64 = 0;
        let mut original: u64 = 0;

        loop {
            let len = fill_chunk(src, &mut self.raw)?;
            if len == 0 {
                break;
            }
            let slice = &self.raw[..len];

            let compressed = self.backend.compress(slice)?;
            // Compression must never expand the stored chunk.
            let payload: &[u8] = if compressed.len() < len {
                &compressed
            } else {
                slice
            };

            write_u32(dst, self.endian, payload.len() as u32)?;
            write_u32(dst, self.endian, len as u32)?;
            dst.write_all(payload)?;
            self.region_offset += 8 + payload.len() as u64;
            stored += 8 + payload.len() as u64;

            let pad = pad_len(self.region_offset);
            if pad > 0 {
                dst.write_all(&[PAD_BYTE; 3][..pad as usize])?;
                self.region_offset += pad;
                stored += pad;
            }

            original += len as u64;
        }

        Ok((stored, original))
    }
}

/// Streaming chunk decoder
///
/// Owns a scratch buffer for compressed payloads, bounded at
/// [`MAX_CHUNK_SIZE`] and reused across chunks and files.
#[derive(Debug)]
pub struct ChunkDecoder {
    backend: Box<dyn ChunkCompressor>,
    endian: Endian,
    scratch: Vec<u8>,
}

impl ChunkDecoder {
    /// Create a decoder over a version-selected backend
    pub fn new(backend: Box<dyn ChunkCompressor>, endian: Endian) -> Self {
        Self {
            backend,
            endian,
            scratch: Vec::with_capacity(MAX_CHUNK_SIZE),
        }
    }

    /// Decode one file's content from `src` into `sink`
    ///
    /// `original_total` is the declared size from the file table and bounds
    /// the decode loop. `region_offset` is the file's starting offset within
    /// the chunked data region, needed for the alignment-padding math.
    pub fn decode_file<R, W>(
        &mut self,
        src: &mut R,
        sink: &mut W,
        original_total: u64,
        region_offset: u64,
    ) -> ChunkResult<()>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        let mut running = region_offset;
        let mut decoded: u64 = 0;

        while decoded < original_total {
            let compressed = read_u32(src, self.endian)?;
            let original = read_u32(src, self.endian)?;

            let out_of_range = compressed == 0
                || original == 0
                || compressed as usize > MAX_CHUNK_SIZE
                || original as usize > MAX_CHUNK_SIZE
                || u64::from(original) > original_total - decoded;
            if out_of_range {
                return Err(ChunkError::CorruptChunkHeader {
                    compressed,
                    original,
                    limit: MAX_CHUNK_SIZE as u32,
                });
            }

            self.scratch.clear();
            self.scratch.resize(compressed as usize, 0);
            src.read_exact(&mut self.scratch)?;

            if compressed == original {
                sink.write_all(&self.scratch)?;
            } else {
                let restored = self.backend.decompress(&self.scratch, original as usize)?;
                if restored.len() != original as usize {
                    return Err(ChunkError::DecompressionFault {
                        expected: original as usize,
                        actual: restored.len(),
                    });
                }
                sink.write_all(&restored)?;
            }

            running += 8 + u64::from(compressed);
            decoded += u64::from(original);

            let pad = pad_len(running);
            if pad > 0 {
                let mut skipped = [0u8; 3];
                src.read_exact(&mut skipped[..pad as usize])?;
                running += pad;
            }
        }

        Ok(())
    }
}

fn fill_chunk<R: Read + ?Sized>(src: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = src.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
