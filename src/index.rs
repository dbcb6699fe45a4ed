//! The immutable result of one collection scan.
//!
//! A [`CollectionIndex`] answers three questions for the presentation
//! layer: which entry does an id address, which path does a folder id
//! address, and which entries does a folder contain (in walk order). It is
//! built once by the scanner and never mutated afterwards, so it can be
//! shared freely between threads behind an `Arc`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::thumbnail::FOLDER_COVER_ID;

/// One indexed directory or comic archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Path checksum, the entry's only external handle
    pub id: u32,
    /// Absolute filesystem path
    pub path: PathBuf,
    /// True for directories, false for archives
    pub is_container: bool,
    /// Display title
    pub title: String,
    /// Encoded cover thumbnail, `None` for folders and unreadable archives
    pub cover: Option<Vec<u8>>,
    /// Number of image pages (always 0 for folders and unreadable archives)
    pub page_count: usize,
}

impl Entry {
    /// Create a folder entry.
    #[must_use]
    pub fn container(id: u32, path: PathBuf, title: String) -> Self {
        Self {
            id,
            path,
            is_container: true,
            title,
            cover: None,
            page_count: 0,
        }
    }

    /// Create an archive entry.
    #[must_use]
    pub fn album(
        id: u32,
        path: PathBuf,
        title: String,
        cover: Option<Vec<u8>>,
        page_count: usize,
    ) -> Self {
        Self {
            id,
            path,
            is_container: false,
            title,
            cover,
            page_count,
        }
    }

    /// Whether a cover thumbnail is available.
    #[must_use]
    pub fn has_cover(&self) -> bool {
        self.cover.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// Kind of an item in a folder listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A comic archive; open it to read pages
    Album,
    /// A subfolder; list it to browse further
    Folder,
}

/// One item of a folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingItem {
    /// Entry id
    pub id: u32,
    /// Display title
    pub title: String,
    /// Album or folder
    pub kind: ItemKind,
    /// Id to request the cover thumbnail with
    pub cover_id: u32,
    /// Page count (albums only)
    pub pages: usize,
}

/// Contents of one folder, in walk order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    /// Folder id, `None` for the collection root
    pub folder_id: Option<u32>,
    /// Folder path
    #[serde(skip)]
    pub path: PathBuf,
    /// Items in the folder
    pub items: Vec<ListingItem>,
}

/// Immutable snapshot of a scanned collection.
#[derive(Debug, Clone)]
pub struct CollectionIndex {
    root: PathBuf,
    by_id: HashMap<u32, Arc<Entry>>,
    by_directory: HashMap<PathBuf, Vec<Arc<Entry>>>,
    dir_by_id: HashMap<u32, PathBuf>,
    folder_cover: Option<Vec<u8>>,
    collisions: usize,
}

impl CollectionIndex {
    /// An index with no entries.
    #[must_use]
    pub fn empty(root: &Path) -> Self {
        IndexBuilder::new(root).build()
    }

    /// Directory the scan started from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of entries (folders and archives).
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns true if the scan found nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Look up any entry by id.
    #[must_use]
    pub fn entry(&self, id: u32) -> Option<&Arc<Entry>> {
        self.by_id.get(&id)
    }

    /// Look up an archive entry by id. Folders are not albums.
    #[must_use]
    pub fn album(&self, id: u32) -> Option<&Arc<Entry>> {
        self.entry(id).filter(|e| !e.is_container)
    }

    /// Path of the folder with the given id.
    #[must_use]
    pub fn directory(&self, id: u32) -> Option<&Path> {
        self.dir_by_id.get(&id).map(PathBuf::as_path)
    }

    /// Children of a directory in walk order. Empty for unknown paths.
    #[must_use]
    pub fn children(&self, dir: &Path) -> &[Arc<Entry>] {
        self.by_directory.get(dir).map(Vec::as_slice).unwrap_or_default()
    }

    /// All entry ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.by_id.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// All folder ids, sorted.
    #[must_use]
    pub fn directory_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.dir_by_id.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate over every entry in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = &Arc<Entry>> {
        self.by_id.values()
    }

    /// Number of paths whose id was already taken by another path.
    #[must_use]
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    /// The shared folder thumbnail.
    #[must_use]
    pub fn folder_cover(&self) -> Option<&[u8]> {
        self.folder_cover.as_deref()
    }

    /// Cover thumbnail to serve for `id`.
    ///
    /// Folders and the reserved placeholder id resolve to the folder cover.
    #[must_use]
    pub fn cover(&self, id: u32) -> Option<&[u8]> {
        if id == FOLDER_COVER_ID && !self.by_id.contains_key(&id) {
            return self.folder_cover();
        }
        let entry = self.by_id.get(&id)?;
        if entry.is_container {
            self.folder_cover()
        } else {
            entry.cover.as_deref().filter(|c| !c.is_empty())
        }
    }

    /// List a folder by id.
    ///
    /// `None` or an id that is not a known folder lists the collection root.
    #[must_use]
    pub fn listing(&self, folder: Option<u32>) -> Listing {
        let (folder_id, path) = match folder.and_then(|id| self.directory(id).map(|p| (id, p))) {
            Some((id, path)) => (Some(id), path.to_path_buf()),
            None => (None, self.root.clone()),
        };

        let items = self
            .children(&path)
            .iter()
            .map(|entry| ListingItem {
                id: entry.id,
                title: entry.title.clone(),
                kind: if entry.is_container {
                    ItemKind::Folder
                } else {
                    ItemKind::Album
                },
                cover_id: if entry.is_container {
                    FOLDER_COVER_ID
                } else {
                    entry.id
                },
                pages: entry.page_count,
            })
            .collect();

        Listing {
            folder_id,
            path,
            items,
        }
    }
}

/// Accumulates entries in walk order and produces a [`CollectionIndex`].
#[derive(Debug)]
pub struct IndexBuilder {
    index: CollectionIndex,
}

impl IndexBuilder {
    /// Start an index rooted at `root`.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            index: CollectionIndex {
                root: root.to_path_buf(),
                by_id: HashMap::new(),
                by_directory: HashMap::new(),
                dir_by_id: HashMap::new(),
                folder_cover: None,
                collisions: 0,
            },
        }
    }

    /// Set the shared folder thumbnail.
    pub fn folder_cover(&mut self, cover: Option<Vec<u8>>) -> &mut Self {
        self.index.folder_cover = cover;
        self
    }

    /// Append an entry to its parent's listing.
    ///
    /// If another path already holds the same id, the first one keeps it;
    /// the newcomer still appears in its folder listing.
    pub fn push(&mut self, entry: Entry) -> &mut Self {
        let entry = Arc::new(entry);
        let parent = entry
            .path
            .parent()
            .map_or_else(|| self.index.root.clone(), Path::to_path_buf);

        match self.index.by_id.get(&entry.id) {
            Some(existing) => {
                self.index.collisions += 1;
                log::warn!(
                    "Id {:08x} collision: {} and {}",
                    entry.id,
                    existing.path.display(),
                    entry.path.display()
                );
            }
            None => {
                if entry.is_container {
                    self.index.dir_by_id.insert(entry.id, entry.path.clone());
                }
                self.index.by_id.insert(entry.id, Arc::clone(&entry));
            }
        }

        self.index.by_directory.entry(parent).or_default().push(entry);
        self
    }

    /// Finish the index.
    #[must_use]
    pub fn build(self) -> CollectionIndex {
        self.index
    }
}
