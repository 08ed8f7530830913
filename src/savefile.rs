//! High-level save editing surface — the primary embedding API.
//!
//! ```no_run
//! use roadsave::savefile::SaveFile;
//!
//! let mut save = SaveFile::load("CompleteSave")?;
//! save.document["SslValue"]["money"] = 250_000.into();
//! save.save()?;
//! # Ok::<(), roadsave::savefile::SaveFileError>(())
//! ```
//!
//! `load` decodes the container and parses the payload as JSON; the original
//! header bytes are retained so `save` can carry the version marker forward.
//! Saving takes a `.bak` copy of the destination, then writes the new bytes
//! to a sibling temp file and renames it into place — a failed encode or
//! write never corrupts the existing file.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::container::{self, ContainerError, DecodeOptions, EncodeOptions};
use crate::header::{SaveHeader, HEADER_SIZE};

#[derive(Error, Debug)]
pub enum SaveFileError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error("save payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Outcome of a successful [`SaveFile::save`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct SaveReport {
    pub saved_path: PathBuf,
    /// `None` when no backup was requested or the destination did not exist.
    pub backup_path: Option<PathBuf>,
}

#[derive(Debug)]
pub struct SaveFile {
    path: PathBuf,
    header: SaveHeader,
    header_bytes: [u8; HEADER_SIZE],
    /// The decoded document.  Edit freely between `load` and `save`.
    pub document: Value,
}

impl SaveFile {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SaveFileError> {
        Self::load_with(path, &DecodeOptions::default())
    }

    pub fn load_with<P: AsRef<Path>>(
        path: P,
        opts: &DecodeOptions,
    ) -> Result<Self, SaveFileError> {
        let path = path.as_ref().to_owned();
        let bytes = fs::read(&path)?;
        let decoded = container::decode_with(&bytes, opts)?;
        let document = serde_json::from_slice(&decoded.payload)?;
        Ok(Self {
            path,
            header: decoded.header,
            header_bytes: decoded.header_bytes,
            document,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Header of the originally loaded file (not of any save since).
    pub fn header(&self) -> &SaveHeader {
        &self.header
    }

    /// Re-encode the document over the originally loaded file, with a
    /// backup and default encode options.
    pub fn save(&self) -> Result<SaveReport, SaveFileError> {
        self.save_with(self.path.clone(), &EncodeOptions::default(), true)
    }

    /// Like [`SaveFile::save`], but writing to a different destination.
    /// A backup is taken only when the destination already exists.
    pub fn save_as<P: AsRef<Path>>(&self, path: P) -> Result<SaveReport, SaveFileError> {
        self.save_with(path, &EncodeOptions::default(), true)
    }

    pub fn save_with<P: AsRef<Path>>(
        &self,
        path: P,
        opts: &EncodeOptions,
        backup: bool,
    ) -> Result<SaveReport, SaveFileError> {
        let dest = path.as_ref();

        // Pretty-printed with two-space indent, matching what the game's own
        // files round-trip through this editor as.
        let payload = serde_json::to_vec_pretty(&self.document)?;
        let bytes = container::encode_with(&self.header_bytes, &payload, opts)?;

        let backup_path = if backup && dest.exists() {
            let bak = sibling_with_suffix(dest, ".bak");
            fs::copy(dest, &bak)?;
            Some(bak)
        } else {
            None
        };

        write_atomic(dest, &bytes)?;
        Ok(SaveReport {
            saved_path: dest.to_owned(),
            backup_path,
        })
    }
}

/// `CompleteSave` → `CompleteSave.bak`, keeping the full original name.
/// Paths without a final component (e.g. ending in `..`) get the suffix
/// appended to the whole path rather than producing a bare dotfile.
fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    match path.file_name() {
        Some(name) => {
            let mut name = name.to_os_string();
            name.push(suffix);
            path.with_file_name(name)
        }
        None => {
            let mut full = path.as_os_str().to_os_string();
            full.push(suffix);
            PathBuf::from(full)
        }
    }
}

/// Write `bytes` to a sibling temp file, fsync, then rename over `dest`.
fn write_atomic(dest: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = sibling_with_suffix(dest, ".tmp");
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    match fs::rename(&tmp, dest) {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e)
        }
    }
}
