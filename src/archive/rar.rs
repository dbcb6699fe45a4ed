//! Rar backend for `.cbr` archives, built on the `unrar` library.
//!
//! Rar archives are read as a forward-only stream of headers, so the entry
//! list is collected once at open time and every extraction walks the
//! headers again until it reaches the requested entry.

use std::path::{Path, PathBuf};

use unrar::Archive as UnrarArchive;

use super::{ArchiveError, ArchiveKind, ArchiveReader};

/// Reads entries from a rar container.
#[derive(Debug)]
pub struct RarReader {
    path: PathBuf,
    names: Vec<String>,
}

impl RarReader {
    /// Open a rar archive and list its file entries.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Corrupt`] if the archive headers cannot be
    /// listed.
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        if !path.exists() {
            return Err(ArchiveError::NotFound(path.to_path_buf()));
        }

        let corrupt = |message: String| ArchiveError::Corrupt {
            path: path.to_path_buf(),
            message,
        };

        let listing = UnrarArchive::new(path)
            .open_for_listing()
            .map_err(|e| corrupt(e.to_string()))?;

        let mut names = Vec::new();
        for header in listing {
            let header = header.map_err(|e| corrupt(e.to_string()))?;
            if header.is_file() {
                names.push(entry_name(&header.filename));
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            names,
        })
    }
}

/// Rar stores native separators; entry names use `/` like zip.
fn entry_name(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

impl ArchiveReader for RarReader {
    fn kind(&self) -> ArchiveKind {
        ArchiveKind::Rar
    }

    fn entry_names(&self) -> &[String] {
        &self.names
    }

    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        let decompress = |message: String| ArchiveError::Decompress {
            path: self.path.clone(),
            name: name.to_string(),
            message,
        };

        let mut archive = UnrarArchive::new(&self.path)
            .open_for_processing()
            .map_err(|e| decompress(e.to_string()))?;

        while let Some(header) = archive.read_header().map_err(|e| decompress(e.to_string()))? {
            let matches = {
                let entry = header.entry();
                entry.is_file() && entry_name(&entry.filename) == name
            };
            if matches {
                let (data, _rest) = header.read().map_err(|e| decompress(e.to_string()))?;
                return Ok(data);
            }
            archive = header.skip().map_err(|e| decompress(e.to_string()))?;
        }

        Err(ArchiveError::EntryNotFound {
            path: self.path.clone(),
            name: name.to_string(),
        })
    }
}
