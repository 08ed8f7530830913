//! Per-chunk compression — the `block` half of a chunk record.
//!
//! A block is `[0x78, 0x9c] ++ raw-deflate(plain) ++ adler32(plain)` with the
//! checksum as 4 big-endian bytes: the pieces of a zlib stream spliced
//! together by hand.  The marker bytes are written literally rather than
//! produced by a zlib encoder, and the trailing checksum is not consulted
//! when reading (see [`crate::container::DecodeOptions`] for the strict
//! mode that does).

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use thiserror::Error;

use crate::checksum;

/// Leading two bytes of every block.
pub const BLOCK_MARKER: [u8; 2] = [0x78, 0x9c];
/// Length of the big-endian Adler-32 trailer.
pub const TRAILER_LEN: usize = 4;

#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("block does not start with the 78 9c marker")]
    MalformedBlockHeader,
    #[error("deflate stream is corrupt or truncated: {0}")]
    Inflate(String),
    #[error("deflate compression failed: {0}")]
    Deflate(String),
}

/// Compress one payload slice into a framed block.
///
/// The compression level only affects the deflate bytes, never round-trip
/// correctness; any level decodes identically.
pub fn compress_chunk(plain: &[u8], level: Compression) -> Result<Vec<u8>, ChunkError> {
    let mut block = Vec::with_capacity(BLOCK_MARKER.len() + plain.len() / 2 + TRAILER_LEN);
    block.extend_from_slice(&BLOCK_MARKER);

    let mut encoder = DeflateEncoder::new(block, level);
    encoder
        .write_all(plain)
        .map_err(|e| ChunkError::Deflate(e.to_string()))?;
    let mut block = encoder
        .finish()
        .map_err(|e| ChunkError::Deflate(e.to_string()))?;

    block.extend_from_slice(&checksum::adler32(plain).to_be_bytes());
    Ok(block)
}

/// Inflate one framed block back into its plaintext.
///
/// Bytes after the logical end of the deflate stream (the Adler-32 trailer)
/// are left unread; the decoder stops at the stream's own end marker, so
/// the trailer never causes inflation to fail.
pub fn decompress_chunk(block: &[u8]) -> Result<Vec<u8>, ChunkError> {
    if block.len() < BLOCK_MARKER.len() || block[..BLOCK_MARKER.len()] != BLOCK_MARKER {
        return Err(ChunkError::MalformedBlockHeader);
    }
    let mut plain = Vec::new();
    DeflateDecoder::new(&block[BLOCK_MARKER.len()..])
        .read_to_end(&mut plain)
        .map_err(|e| ChunkError::Inflate(e.to_string()))?;
    Ok(plain)
}
