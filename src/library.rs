//! Reading pages out of indexed albums.
//!
//! The index only supplies an album's path and title; page bytes are always
//! read from a freshly opened archive that is released before the call
//! returns. Two reads of different albums never wait on each other, and a
//! rescan never waits on a read.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::archive::{Archive, ArchiveError};
use crate::index::{CollectionIndex, Entry};

/// Errors that can occur while serving an album page.
#[derive(thiserror::Error, Debug)]
pub enum LibraryError {
    /// No album has the requested id.
    #[error("Album {0:08x} not found")]
    AlbumNotFound(u32),

    /// The album has fewer pages than requested.
    #[error("Page {page} not found in album {album:08x} ({count} pages)")]
    PageNotFound {
        /// Album id
        album: u32,
        /// Requested zero-based page
        page: usize,
        /// Pages in the album
        count: usize,
    },

    /// The archive could not be read.
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

impl LibraryError {
    /// Whether the request addressed something that does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::AlbumNotFound(_) | Self::PageNotFound { .. } => true,
            Self::Archive(e) => e.is_not_found(),
        }
    }
}

/// Parse an id given as decimal or as `0x`-prefixed hex.
///
/// ```
/// use jomics::library::parse_id;
///
/// assert_eq!(parse_id("0xa38ba0ff"), Some(0xa38b_a0ff));
/// assert_eq!(parse_id("42"), Some(42));
/// assert_eq!(parse_id("forty-two"), None);
/// ```
#[must_use]
pub fn parse_id(s: &str) -> Option<u32> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

/// Navigation state for viewing one page of an album.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageView {
    /// Zero-based page index
    pub page: usize,
    /// One-based page number for display
    pub number: usize,
    /// Total pages
    pub count: usize,
    /// First page index
    pub first: usize,
    /// Previous page index (clamped to the first page)
    pub prev: usize,
    /// Next page index (clamped to the last page)
    pub next: usize,
    /// Last page index
    pub last: usize,
}

impl PageView {
    /// View of `page` in an album of `count` pages, or `None` if out of range.
    #[must_use]
    pub fn new(page: usize, count: usize) -> Option<Self> {
        if page >= count {
            return None;
        }
        let last = count - 1;
        Some(Self {
            page,
            number: page + 1,
            count,
            first: 0,
            prev: page.saturating_sub(1),
            next: (page + 1).min(last),
            last,
        })
    }

    /// Whether there is a page before this one.
    #[must_use]
    pub fn has_prev(&self) -> bool {
        self.page > 0
    }

    /// Whether there is a page after this one.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page < self.last
    }
}

/// An open album, released on drop.
#[derive(Debug)]
pub struct Album {
    entry: Arc<Entry>,
    archive: Archive,
}

impl Album {
    /// Album id.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.entry.id
    }

    /// Display title from the index.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.entry.title
    }

    /// Number of image pages, read from the archive itself.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.archive.page_count()
    }

    /// Navigation for zero-based `page`.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::PageNotFound`] if `page` is out of range.
    pub fn view(&self, page: usize) -> Result<PageView, LibraryError> {
        PageView::new(page, self.page_count()).ok_or_else(|| self.page_not_found(page))
    }

    /// Bytes of zero-based `page`.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::PageNotFound`] if `page` is out of range and
    /// [`LibraryError::Archive`] if the entry cannot be decompressed.
    pub fn page(&mut self, page: usize) -> Result<Vec<u8>, LibraryError> {
        if page >= self.page_count() {
            return Err(self.page_not_found(page));
        }
        Ok(self.archive.extract_page(page)?)
    }

    /// Release the archive.
    pub fn close(self) {
        self.archive.close();
    }

    fn page_not_found(&self, page: usize) -> LibraryError {
        LibraryError::PageNotFound {
            album: self.entry.id,
            page,
            count: self.page_count(),
        }
    }
}

/// Open the album `id` of `index`.
///
/// # Errors
///
/// Returns [`LibraryError::AlbumNotFound`] for an unknown id or a folder id,
/// and [`LibraryError::Archive`] if the archive cannot be opened.
pub fn open_album(index: &CollectionIndex, id: u32) -> Result<Album, LibraryError> {
    let entry = index.album(id).ok_or(LibraryError::AlbumNotFound(id))?;
    let archive = Archive::open(&entry.path)?;
    Ok(Album {
        entry: Arc::clone(entry),
        archive,
    })
}

/// Read zero-based `page` of album `id`, opening and releasing the archive
/// within the call.
///
/// # Errors
///
/// See [`open_album`] and [`Album::page`].
pub fn read_page(index: &CollectionIndex, id: u32, page: usize) -> Result<Vec<u8>, LibraryError> {
    let mut album = open_album(index, id)?;
    let data = album.page(page);
    album.close();
    data
}

/// Read zero-based `page` of the album `id` stored at `path`, without an
/// index.
///
/// # Errors
///
/// Returns [`LibraryError::PageNotFound`] if `page` is out of range and
/// [`LibraryError::Archive`] if the archive cannot be read.
pub fn read_page_at(path: &Path, id: u32, page: usize) -> Result<Vec<u8>, LibraryError> {
    let mut archive = Archive::open(path)?;
    let count = archive.page_count();
    if page >= count {
        return Err(LibraryError::PageNotFound {
            album: id,
            page,
            count,
        });
    }
    let data = archive.extract_page(page)?;
    archive.close();
    Ok(data)
}
