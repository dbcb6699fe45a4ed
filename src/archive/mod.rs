//! Format-independent access to comic archives.
//!
//! This module provides the [`Archive`] handle, which hides the container
//! format (zip-based `.cbz` or rar-based `.cbr`) behind the [`ArchiveReader`]
//! trait. Callers never branch on format: the backend is chosen when the
//! archive is opened.
//!
//! # Page Order
//!
//! [`Archive::image_pages`] returns the image entries sorted
//! lexicographically by entry name. Page `0` is always the first image in
//! that order, regardless of how the container stores its entries, and every
//! consumer (cover generation, page reading) depends on it.
//!
//! # Resource Lifetime
//!
//! An [`Archive`] owns its open file. The file is released when the handle is
//! dropped, so every exit path (including `?` early returns) releases it.
//! [`Archive::close`] consumes the handle for callers that want to end the
//! scope explicitly.
//!
//! # Example
//!
//! ```no_run
//! use jomics::archive::Archive;
//! use std::path::Path;
//!
//! let mut archive = Archive::open(Path::new("/comics/Foo_Bar.cbz"))?;
//! let pages = archive.image_pages().to_vec();
//! let cover = archive.extract_page(0)?;
//! println!("{} pages, cover is {} bytes", pages.len(), cover.len());
//! archive.close();
//! # Ok::<(), jomics::archive::ArchiveError>(())
//! ```

pub mod rar;
pub mod zip;

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

pub use self::rar::RarReader;
pub use self::zip::ZipReader;

/// File extensions (lowercase, without dot) recognized as page images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const ZIP_EMPTY_MAGIC: &[u8] = b"PK\x05\x06";
const RAR_MAGIC: &[u8] = b"Rar!\x1a\x07";

/// Errors that can occur while reading an archive.
#[derive(thiserror::Error, Debug)]
pub enum ArchiveError {
    /// The archive file does not exist.
    #[error("Archive not found: {0}")]
    NotFound(PathBuf),

    /// The file is neither a zip nor a rar container.
    #[error("Unsupported archive format: {0}")]
    UnsupportedFormat(PathBuf),

    /// The container could not be opened or its index could not be listed.
    #[error("Corrupt archive {path}: {message}")]
    Corrupt {
        /// Path of the archive
        path: PathBuf,
        /// Backend error description
        message: String,
    },

    /// The requested entry is not present in the archive.
    #[error("Entry '{name}' not found in {path}")]
    EntryNotFound {
        /// Path of the archive
        path: PathBuf,
        /// Requested entry name
        name: String,
    },

    /// The requested page index is beyond the archive's page count.
    #[error("Page {page} not found in {path} ({count} pages)")]
    PageNotFound {
        /// Path of the archive
        path: PathBuf,
        /// Requested zero-based page index
        page: usize,
        /// Number of image pages in the archive
        count: usize,
    },

    /// An entry exists but could not be decompressed.
    #[error("Failed to decompress '{name}' from {path}: {message}")]
    Decompress {
        /// Path of the archive
        path: PathBuf,
        /// Entry name
        name: String,
        /// Backend error description
        message: String,
    },

    /// An I/O error occurred while accessing the archive file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ArchiveError {
    /// Whether this error means "the thing asked for does not exist".
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::EntryNotFound { .. } | Self::PageNotFound { .. }
        )
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path.to_path_buf())
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Container format of a comic archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// Zip-based container (`.cbz`, `.zip`).
    Zip,
    /// Rar-based container (`.cbr`, `.rar`).
    Rar,
}

impl ArchiveKind {
    /// Guess the format from a file extension.
    #[must_use]
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_ascii_lowercase)?;
        match ext.as_str() {
            "cbz" | "zip" => Some(Self::Zip),
            "cbr" | "rar" => Some(Self::Rar),
            _ => None,
        }
    }

    /// Detect the format from the leading bytes of a file.
    #[must_use]
    pub fn sniff(header: &[u8]) -> Option<Self> {
        if header.starts_with(ZIP_MAGIC) || header.starts_with(ZIP_EMPTY_MAGIC) {
            Some(Self::Zip)
        } else if header.starts_with(RAR_MAGIC) {
            Some(Self::Rar)
        } else {
            None
        }
    }

    /// Detect the format of the file at `path`.
    ///
    /// Magic bytes win over the extension, so a `.cbr` that is really a zip
    /// still opens with the zip backend.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::NotFound`] or [`ArchiveError::Io`] if the file
    /// cannot be read, and [`ArchiveError::UnsupportedFormat`] if neither the
    /// header nor the extension identifies a known container.
    pub fn detect(path: &Path) -> Result<Self, ArchiveError> {
        let mut header = [0u8; 8];
        let mut file = File::open(path).map_err(|e| ArchiveError::io(path, e))?;
        let mut read = 0;
        while read < header.len() {
            match file.read(&mut header[read..]) {
                Ok(0) => break,
                Ok(n) => read += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(ArchiveError::io(path, e)),
            }
        }

        Self::sniff(&header[..read])
            .or_else(|| Self::from_extension(path))
            .ok_or_else(|| ArchiveError::UnsupportedFormat(path.to_path_buf()))
    }
}

impl std::fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Zip => write!(f, "zip"),
            Self::Rar => write!(f, "rar"),
        }
    }
}

/// Capability interface implemented by every archive backend.
///
/// A reader is created already open; dropping it releases the underlying
/// file.
pub trait ArchiveReader: Send {
    /// The container format this reader handles.
    fn kind(&self) -> ArchiveKind;

    /// Names of all file entries (directories excluded), in container order.
    fn entry_names(&self) -> &[String];

    /// Read the full decompressed contents of one entry.
    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, ArchiveError>;
}

/// Returns true if an entry name looks like a page image.
#[must_use]
pub fn is_image_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
}

/// Filter entry names to images and sort them into page order.
#[must_use]
pub fn sort_image_pages<'a, I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut pages: Vec<String> = names
        .into_iter()
        .filter(|name| is_image_name(name))
        .cloned()
        .collect();
    pages.sort();
    pages
}

/// An open comic archive.
pub struct Archive {
    path: PathBuf,
    reader: Box<dyn ArchiveReader>,
    pages: Vec<String>,
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("path", &self.path)
            .field("kind", &self.reader.kind())
            .field("pages", &self.pages.len())
            .finish()
    }
}

impl Archive {
    /// Open the archive at `path`, choosing the backend from its contents.
    ///
    /// # Errors
    ///
    /// Fails with [`ArchiveError`] if the file cannot be opened or its entry
    /// index cannot be listed.
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let reader: Box<dyn ArchiveReader> = match ArchiveKind::detect(path)? {
            ArchiveKind::Zip => Box::new(ZipReader::open(path)?),
            ArchiveKind::Rar => Box::new(RarReader::open(path)?),
        };
        Ok(Self::from_reader(path, reader))
    }

    /// Wrap an already open backend.
    #[must_use]
    pub fn from_reader(path: &Path, reader: Box<dyn ArchiveReader>) -> Self {
        let pages = sort_image_pages(reader.entry_names());
        log::trace!(
            "Opened {} archive {} ({} pages)",
            reader.kind(),
            path.display(),
            pages.len()
        );
        Self {
            path: path.to_path_buf(),
            reader,
            pages,
        }
    }

    /// Path of the archive file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Container format.
    #[must_use]
    pub fn kind(&self) -> ArchiveKind {
        self.reader.kind()
    }

    /// All file entry names in container order.
    #[must_use]
    pub fn entry_names(&self) -> &[String] {
        self.reader.entry_names()
    }

    /// Image entry names in page order.
    #[must_use]
    pub fn image_pages(&self) -> &[String] {
        &self.pages
    }

    /// Number of image pages.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Find an entry by name, ignoring ASCII case.
    #[must_use]
    pub fn find_entry(&self, name: &str) -> Option<&str> {
        self.entry_names()
            .iter()
            .find(|entry| entry.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    /// Read the contents of an entry by exact name.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::EntryNotFound`] if the archive has no such
    /// entry, or [`ArchiveError::Decompress`] if it cannot be read.
    pub fn extract(&mut self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        self.reader.read_entry(name)
    }

    /// Read the image at zero-based `page` in page order.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::PageNotFound`] if `page` is out of range.
    pub fn extract_page(&mut self, page: usize) -> Result<Vec<u8>, ArchiveError> {
        let name = self
            .pages
            .get(page)
            .cloned()
            .ok_or_else(|| ArchiveError::PageNotFound {
                path: self.path.clone(),
                page,
                count: self.pages.len(),
            })?;
        self.reader.read_entry(&name)
    }

    /// Release the archive.
    pub fn close(self) {
        log::trace!("Closing archive {}", self.path.display());
    }
}
