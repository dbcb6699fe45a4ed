//! Zip backend for `.cbz` archives.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use ::zip::result::ZipError;
use ::zip::ZipArchive;

use super::{ArchiveError, ArchiveKind, ArchiveReader};

/// Reads entries from a zip container.
#[derive(Debug)]
pub struct ZipReader {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
    names: Vec<String>,
}

impl ZipReader {
    /// Open a zip archive and list its file entries.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Corrupt`] if the central directory cannot be
    /// read.
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let file = File::open(path).map_err(|e| ArchiveError::io(path, e))?;
        let mut archive =
            ZipArchive::new(BufReader::new(file)).map_err(|e| ArchiveError::Corrupt {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let mut names = Vec::with_capacity(archive.len());
        for idx in 0..archive.len() {
            let entry = archive.by_index(idx).map_err(|e| ArchiveError::Corrupt {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            if entry.is_dir() {
                continue;
            }
            names.push(entry.name().to_string());
        }

        Ok(Self {
            path: path.to_path_buf(),
            archive,
            names,
        })
    }
}

impl ArchiveReader for ZipReader {
    fn kind(&self) -> ArchiveKind {
        ArchiveKind::Zip
    }

    fn entry_names(&self) -> &[String] {
        &self.names
    }

    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        let mut entry = self.archive.by_name(name).map_err(|e| match e {
            ZipError::FileNotFound => ArchiveError::EntryNotFound {
                path: self.path.clone(),
                name: name.to_string(),
            },
            other => ArchiveError::Decompress {
                path: self.path.clone(),
                name: name.to_string(),
                message: other.to_string(),
            },
        })?;

        let mut data = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
        entry
            .read_to_end(&mut data)
            .map_err(|e| ArchiveError::Decompress {
                path: self.path.clone(),
                name: name.to_string(),
                message: e.to_string(),
            })?;
        Ok(data)
    }
}
