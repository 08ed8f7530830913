//! The fixed 53-byte CompleteSave file header.
//!
//! Layout (all integers little-endian):
//!
//! | offset | size | field                                               |
//! |-------:|-----:|-----------------------------------------------------|
//! |      0 |    4 | version marker — opaque, preserved verbatim          |
//! |      4 |    4 | compressed_size — byte length of the chunk body      |
//! |      8 |    4 | reserved, zero on write, ignored on read             |
//! |     12 |    4 | decompressed_size — byte length of the payload       |
//! |     16 |    4 | reserved, zero on write, ignored on read             |
//! |     20 |   32 | MD5 of the chunk body, lowercase hex ASCII           |
//! |     52 |    1 | format tag, always `0x03`                            |
//!
//! The version marker is never interpreted: the game ships several format
//! revisions and the editor must write back exactly what it read.  Whether
//! any real file carries nonzero reserved fields is unknown; they are
//! zeroed on write.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

/// Total header length in bytes.
pub const HEADER_SIZE: usize = 53;
/// Length of the hex MD5 digest field.
pub const DIGEST_LEN: usize = 32;
/// Constant trailing byte of every header.
pub const FORMAT_TAG: u8 = 0x03;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveHeader {
    /// Opaque 4-byte version marker, carried over from the source file.
    pub magic: [u8; 4],
    pub compressed_size: u32,
    pub decompressed_size: u32,
    /// MD5 of the chunk body as 32 lowercase hex ASCII bytes.
    pub digest: [u8; DIGEST_LEN],
}

impl SaveHeader {
    /// Read a header.  No field is validated — real files produced by other
    /// tools are accepted as long as the 53 bytes are present; strict
    /// checking happens at the container level.
    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        let compressed_size = reader.read_u32::<LittleEndian>()?;
        let mut reserved = [0u8; 4];
        reader.read_exact(&mut reserved)?;
        let decompressed_size = reader.read_u32::<LittleEndian>()?;
        reader.read_exact(&mut reserved)?;
        let mut digest = [0u8; DIGEST_LEN];
        reader.read_exact(&mut digest)?;
        let _tag = reader.read_u8()?;
        Ok(Self {
            magic,
            compressed_size,
            decompressed_size,
            digest,
        })
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&self.magic)?;
        writer.write_u32::<LittleEndian>(self.compressed_size)?;
        writer.write_all(&[0u8; 4])?;
        writer.write_u32::<LittleEndian>(self.decompressed_size)?;
        writer.write_all(&[0u8; 4])?;
        writer.write_all(&self.digest)?;
        writer.write_u8(FORMAT_TAG)?;
        Ok(())
    }

    /// The digest field as a string slice, when it is valid ASCII.
    pub fn digest_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.digest).ok()
    }
}
