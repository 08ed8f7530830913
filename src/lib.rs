pub mod checksum;
pub mod chunk;
pub mod container;
pub mod header;
pub mod savefile;

pub use container::{decode, decode_with, encode, encode_with};
pub use container::{ContainerError, DecodeOptions, DecodedSave, EncodeOptions};
pub use header::SaveHeader;
pub use savefile::SaveFile;
