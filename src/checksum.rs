//! File and chunk integrity primitives.
//!
//! MD5 is the file-level digest the game stores in the header (as lowercase
//! hex ASCII over the chunk body); Adler-32 is the per-chunk trailer.
//! Neither is cryptographic — they are what the format demands.

use md5::{Digest, Md5};

/// Lowercase hex MD5 of `data`.  Total for any input, including empty.
pub fn md5_hex(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

/// Adler-32 of `data`, embedded big-endian in every block trailer.
pub fn adler32(data: &[u8]) -> u32 {
    adler32::RollingAdler32::from_buffer(data).hash()
}
