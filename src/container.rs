//! Container decode/encode — the header-plus-chunk-records file layout.
//!
//! # Reader
//! [`decode`] walks the byte buffer from offset 53, splitting it into chunk
//! records (`uncompressed_size: u32 LE`, `block_len: u32 LE`, then
//! `block_len` block bytes), inflates every block and concatenates the
//! plaintexts.  The reference reader is deliberately loose: the header's
//! length fields, its MD5 digest and each block's Adler-32 trailer are all
//! ignored, matching the behavior real files were produced against.
//! [`DecodeOptions::strict`] opts into verifying all of them.
//!
//! # Writer
//! [`encode`] splits the payload into slices of at most
//! [`EncodeOptions::chunk_size`] bytes, compresses each into a chunk record,
//! computes the MD5 digest over the assembled body and emits a fresh header
//! carrying the source file's version marker.  A zero-length payload yields
//! zero records.
//!
//! Both directions are single-pass, stateless transforms over in-memory
//! buffers; neither touches the filesystem.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use flate2::Compression;
use std::io;
use thiserror::Error;

use crate::checksum;
use crate::chunk::{self, ChunkError, BLOCK_MARKER, TRAILER_LEN};
use crate::header::{SaveHeader, DIGEST_LEN, HEADER_SIZE};

/// Default maximum plaintext bytes per chunk record: 1 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;
/// Bytes of the two length fields preceding every block.
pub const RECORD_OVERHEAD: usize = 8;

// ── Options ──────────────────────────────────────────────────────────────────

/// Configuration for [`decode_with`].
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Verify header lengths, the MD5 digest and every chunk's Adler-32
    /// trailer, surfacing [`ContainerError::IntegrityMismatch`] on the first
    /// disagreement.  Off by default: files written by other tools are not
    /// guaranteed to satisfy the stricter checks.
    pub strict: bool,
}

/// Configuration for [`encode_with`].
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// Maximum plaintext bytes per chunk record.
    pub chunk_size: usize,
    /// Deflate level.  Any level round-trips identically.
    pub level: Compression,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            level: Compression::default(),
        }
    }
}

// ── Errors ───────────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("file is shorter than the {HEADER_SIZE}-byte header")]
    TruncatedHeader,
    #[error("chunk record at offset {offset}: {declared} bytes declared, {remaining} remain")]
    TruncatedRecord {
        offset: usize,
        declared: usize,
        remaining: usize,
    },
    #[error(transparent)]
    Chunk(#[from] ChunkError),
    #[error("integrity mismatch in {field}: stored {expected}, actual {actual}")]
    IntegrityMismatch {
        field: &'static str,
        expected: String,
        actual: String,
    },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

// ── Decoding ─────────────────────────────────────────────────────────────────

/// Result of a successful [`decode`].
#[derive(Debug, Clone)]
pub struct DecodedSave {
    /// Parsed view of the header.
    pub header: SaveHeader,
    /// The original 53 header bytes, byte for byte.  Needed at encode time
    /// to carry the version marker forward.
    pub header_bytes: [u8; HEADER_SIZE],
    /// The fully decompressed payload, concatenated across all records.
    pub payload: Vec<u8>,
}

/// Parse the header without touching the chunk records.
pub fn read_header(file: &[u8]) -> Result<SaveHeader, ContainerError> {
    if file.len() < HEADER_SIZE {
        return Err(ContainerError::TruncatedHeader);
    }
    Ok(SaveHeader::read(&file[..HEADER_SIZE])?)
}

/// Decode a complete save file with the legacy (loose) reader behavior.
pub fn decode(file: &[u8]) -> Result<DecodedSave, ContainerError> {
    decode_with(file, &DecodeOptions::default())
}

pub fn decode_with(file: &[u8], opts: &DecodeOptions) -> Result<DecodedSave, ContainerError> {
    let header = read_header(file)?;
    let mut header_bytes = [0u8; HEADER_SIZE];
    header_bytes.copy_from_slice(&file[..HEADER_SIZE]);

    let body = &file[HEADER_SIZE..];
    // Capacity hint only; the header field is untrusted.
    let cap = (header.decompressed_size as usize).min(body.len().saturating_mul(16));
    let mut payload = Vec::with_capacity(cap);
    let mut offset = 0usize;

    while offset < body.len() {
        let remaining = body.len() - offset;
        if remaining < RECORD_OVERHEAD {
            return Err(ContainerError::TruncatedRecord {
                offset: HEADER_SIZE + offset,
                declared: RECORD_OVERHEAD,
                remaining,
            });
        }
        let plain_size = LittleEndian::read_u32(&body[offset..offset + 4]) as usize;
        let block_len = LittleEndian::read_u32(&body[offset + 4..offset + 8]) as usize;

        let start = offset + RECORD_OVERHEAD;
        if block_len > body.len() - start {
            return Err(ContainerError::TruncatedRecord {
                offset: HEADER_SIZE + offset,
                declared: block_len,
                remaining: body.len() - start,
            });
        }

        let block = &body[start..start + block_len];
        let plain = chunk::decompress_chunk(block)?;

        if opts.strict {
            if plain.len() != plain_size {
                return Err(ContainerError::IntegrityMismatch {
                    field: "chunk uncompressed size",
                    expected: plain_size.to_string(),
                    actual: plain.len().to_string(),
                });
            }
            verify_chunk_trailer(block, &plain)?;
        }

        payload.extend_from_slice(&plain);
        offset = start + block_len;
    }

    if opts.strict {
        verify_header(&header, body, &payload)?;
    }

    Ok(DecodedSave {
        header,
        header_bytes,
        payload,
    })
}

fn verify_chunk_trailer(block: &[u8], plain: &[u8]) -> Result<(), ContainerError> {
    if block.len() < BLOCK_MARKER.len() + TRAILER_LEN {
        return Err(ContainerError::IntegrityMismatch {
            field: "chunk checksum",
            expected: "4-byte adler-32 trailer".to_string(),
            actual: format!("{}-byte block", block.len()),
        });
    }
    let stored = BigEndian::read_u32(&block[block.len() - TRAILER_LEN..]);
    let actual = checksum::adler32(plain);
    if stored != actual {
        return Err(ContainerError::IntegrityMismatch {
            field: "chunk checksum",
            expected: format!("{stored:08x}"),
            actual: format!("{actual:08x}"),
        });
    }
    Ok(())
}

fn verify_header(header: &SaveHeader, body: &[u8], payload: &[u8]) -> Result<(), ContainerError> {
    if header.compressed_size as usize != body.len() {
        return Err(ContainerError::IntegrityMismatch {
            field: "compressed length",
            expected: header.compressed_size.to_string(),
            actual: body.len().to_string(),
        });
    }
    if header.decompressed_size as usize != payload.len() {
        return Err(ContainerError::IntegrityMismatch {
            field: "decompressed length",
            expected: header.decompressed_size.to_string(),
            actual: payload.len().to_string(),
        });
    }
    let digest = checksum::md5_hex(body);
    if header.digest[..] != *digest.as_bytes() {
        return Err(ContainerError::IntegrityMismatch {
            field: "md5 digest",
            expected: String::from_utf8_lossy(&header.digest).into_owned(),
            actual: digest,
        });
    }
    Ok(())
}

// ── Encoding ─────────────────────────────────────────────────────────────────

/// Encode a payload against the original file's header, with defaults.
pub fn encode(
    original_header: &[u8; HEADER_SIZE],
    payload: &[u8],
) -> Result<Vec<u8>, ContainerError> {
    encode_with(original_header, payload, &EncodeOptions::default())
}

/// Encode a payload against the original file's header.
///
/// Only the first four bytes of `original_header` (the version marker) are
/// consulted; every other header field is freshly computed.
pub fn encode_with(
    original_header: &[u8; HEADER_SIZE],
    payload: &[u8],
    opts: &EncodeOptions,
) -> Result<Vec<u8>, ContainerError> {
    let chunk_size = opts.chunk_size.max(1);

    let mut body = Vec::with_capacity(RECORD_OVERHEAD + payload.len() / 2);
    for slice in payload.chunks(chunk_size) {
        let block = chunk::compress_chunk(slice, opts.level)?;
        let mut record_header = [0u8; RECORD_OVERHEAD];
        LittleEndian::write_u32(&mut record_header[..4], slice.len() as u32);
        LittleEndian::write_u32(&mut record_header[4..], block.len() as u32);
        body.extend_from_slice(&record_header);
        body.extend_from_slice(&block);
    }

    let digest_hex = checksum::md5_hex(&body);
    let mut digest = [0u8; DIGEST_LEN];
    digest.copy_from_slice(digest_hex.as_bytes());

    let mut magic = [0u8; 4];
    magic.copy_from_slice(&original_header[..4]);

    let header = SaveHeader {
        magic,
        compressed_size: body.len() as u32,
        decompressed_size: payload.len() as u32,
        digest,
    };

    let mut out = Vec::with_capacity(HEADER_SIZE + body.len());
    header.write(&mut out)?;
    out.extend_from_slice(&body);
    Ok(out)
}

// ── Inspection ───────────────────────────────────────────────────────────────

/// Layout of one chunk record, as reported by [`inspect`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct ChunkInfo {
    /// Absolute file offset of the record's length fields.
    pub offset: usize,
    pub uncompressed_size: u32,
    pub block_len: u32,
}

/// Walk the chunk records without inflating them.
///
/// Checks record bounds and each block's leading marker, so a truncated or
/// misframed file fails the same way [`decode`] would before inflation.
pub fn inspect(file: &[u8]) -> Result<Vec<ChunkInfo>, ContainerError> {
    if file.len() < HEADER_SIZE {
        return Err(ContainerError::TruncatedHeader);
    }
    let body = &file[HEADER_SIZE..];
    let mut chunks = Vec::new();
    let mut offset = 0usize;

    while offset < body.len() {
        let remaining = body.len() - offset;
        if remaining < RECORD_OVERHEAD {
            return Err(ContainerError::TruncatedRecord {
                offset: HEADER_SIZE + offset,
                declared: RECORD_OVERHEAD,
                remaining,
            });
        }
        let uncompressed_size = LittleEndian::read_u32(&body[offset..offset + 4]);
        let block_len = LittleEndian::read_u32(&body[offset + 4..offset + 8]);

        let start = offset + RECORD_OVERHEAD;
        if block_len as usize > body.len() - start {
            return Err(ContainerError::TruncatedRecord {
                offset: HEADER_SIZE + offset,
                declared: block_len as usize,
                remaining: body.len() - start,
            });
        }
        let block = &body[start..start + block_len as usize];
        if block.len() < BLOCK_MARKER.len() || block[..BLOCK_MARKER.len()] != BLOCK_MARKER {
            return Err(ChunkError::MalformedBlockHeader.into());
        }

        chunks.push(ChunkInfo {
            offset: HEADER_SIZE + offset,
            uncompressed_size,
            block_len,
        });
        offset = start + block_len as usize;
    }

    Ok(chunks)
}
