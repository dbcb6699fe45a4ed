//! Scanner that turns a directory tree into a [`CollectionIndex`].
//!
//! This module provides functionality for:
//! - Walking the collection root in a deterministic order ([`walker`])
//! - Deriving stable ids and display titles from paths ([`path_utils`])
//! - Opening every archive to read its descriptor title and produce a cover
//!   thumbnail through the [`ThumbnailCache`]
//!
//! # Failure Policy
//!
//! Only an unreadable root fails a scan. A corrupt archive, an archive
//! without images or an undecodable cover is logged; the entry keeps its
//! filename title and has no cover.
//!
//! # Example
//!
//! ```no_run
//! use jomics::scanner::{CollectionScanner, ScannerConfig};
//! use jomics::thumbnail::ThumbnailCache;
//! use std::path::Path;
//!
//! let cache = ThumbnailCache::new(Path::new("/tmp/jomics-cache"), 400)?;
//! let scanner = CollectionScanner::new(ScannerConfig::default(), cache);
//! let index = scanner.scan(Path::new("/comics"))?;
//! for item in index.listing(None).items {
//!     println!("{:08x} {}", item.id, item.title);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod path_utils;
pub mod walker;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::archive::Archive;
use crate::index::{CollectionIndex, Entry, IndexBuilder};
use crate::metadata;
use crate::progress::ProgressCallback;
use crate::thumbnail::{
    GeneratedFolderIcon, PlaceholderSource, ThumbnailCache, ThumbnailFormat, FOLDER_COVER_ID,
};

pub use path_utils::{entry_id, title_from_path};
pub use walker::{Node, Walker};

/// Archive extensions indexed by default.
pub const DEFAULT_ARCHIVE_EXTENSIONS: &[&str] = &["cbz", "cbr"];

/// Name of the progress phase reported while preparing albums.
pub const COVERS_PHASE: &str = "covers";

/// Configuration for collection scanning.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// File extensions treated as comic archives (case-insensitive).
    pub archive_extensions: Vec<String>,

    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Worker threads for opening archives and generating covers.
    /// Zero uses rayon's default.
    pub threads: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            archive_extensions: DEFAULT_ARCHIVE_EXTENSIONS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            follow_symlinks: false,
            skip_hidden: false,
            threads: 0,
        }
    }
}

/// Errors that make a whole scan attempt fail.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when reading the root directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The root directory was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The root is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while reading the root.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The worker pool could not be created.
    #[error("Failed to start scan workers: {0}")]
    ThreadPool(String),
}

/// What the scanner learned about one archive.
#[derive(Debug, Default)]
struct AlbumInfo {
    title: Option<String>,
    cover: Option<Vec<u8>>,
    pages: usize,
}

/// Builds [`CollectionIndex`] snapshots.
pub struct CollectionScanner {
    config: ScannerConfig,
    cache: ThumbnailCache,
    placeholder: Arc<dyn PlaceholderSource>,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for CollectionScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionScanner")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl CollectionScanner {
    /// Create a scanner writing thumbnails to `cache`, using the generated
    /// folder icon as placeholder.
    #[must_use]
    pub fn new(config: ScannerConfig, cache: ThumbnailCache) -> Self {
        Self {
            config,
            cache,
            placeholder: Arc::new(GeneratedFolderIcon),
            progress: None,
        }
    }

    /// Use a different folder placeholder image.
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: Arc<dyn PlaceholderSource>) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Report album preparation progress to `callback`.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// The thumbnail cache used by this scanner.
    #[must_use]
    pub fn cache(&self) -> &ThumbnailCache {
        &self.cache
    }

    /// Scanner configuration.
    #[must_use]
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Scan `root` and build a new index.
    ///
    /// Every archive is opened, titled and given a cover before this
    /// returns.
    ///
    /// # Errors
    ///
    /// Returns a [`ScanError`] if `root` is not a readable directory.
    pub fn scan(&self, root: &Path) -> Result<CollectionIndex, ScanError> {
        let root = path_utils::normalize_root(root).map_err(|source| ScanError::Io {
            path: root.to_path_buf(),
            source,
        })?;

        log::info!("Scanning {}", root.display());
        let nodes = Walker::new(&root, &self.config).walk()?;

        let albums = self.prepare_albums(&nodes)?;
        let folder_cover = self.folder_cover();

        let mut builder = IndexBuilder::new(&root);
        builder.folder_cover(folder_cover);

        let mut albums = albums.into_iter();
        for node in nodes {
            let id = entry_id(&node.path);
            let fallback = title_from_path(&node.path, node.is_dir);
            let entry = if node.is_dir {
                Entry::container(id, node.path, fallback)
            } else {
                let info = albums.next().unwrap_or_default();
                Entry::album(
                    id,
                    node.path,
                    info.title.unwrap_or(fallback),
                    info.cover,
                    info.pages,
                )
            };
            builder.push(entry);
        }

        let index = builder.build();
        log::info!(
            "Indexed {} entries under {} ({} folders)",
            index.len(),
            root.display(),
            index.directory_ids().len()
        );
        Ok(index)
    }

    /// Find the archive whose id is `id` without opening any archive.
    ///
    /// The walk stops at the first match in walk order, the same entry a
    /// full scan keeps when ids collide. Folder ids never match.
    ///
    /// # Errors
    ///
    /// Returns a [`ScanError`] if `root` is not a readable directory.
    pub fn locate(&self, root: &Path, id: u32) -> Result<Option<PathBuf>, ScanError> {
        let root = path_utils::normalize_root(root).map_err(|source| ScanError::Io {
            path: root.to_path_buf(),
            source,
        })?;

        let found = Walker::new(&root, &self.config)
            .walk()?
            .into_iter()
            .find(|node| !node.is_dir && entry_id(&node.path) == id)
            .map(|node| node.path);
        log::debug!("Album {:08x} resolved to {:?}", id, found);
        Ok(found)
    }

    /// Open every archive node in parallel, preserving walk order.
    fn prepare_albums(&self, nodes: &[Node]) -> Result<Vec<AlbumInfo>, ScanError> {
        let archives: Vec<&Path> = nodes
            .iter()
            .filter(|n| !n.is_dir)
            .map(|n| n.path.as_path())
            .collect();

        if let Some(ref callback) = self.progress {
            callback.on_phase_start(COVERS_PHASE, archives.len());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
            .map_err(|e| ScanError::ThreadPool(e.to_string()))?;

        let done = AtomicUsize::new(0);
        let infos = pool.install(|| {
            archives
                .par_iter()
                .map(|path| {
                    let info = self.prepare_album(path);
                    let current = done.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(ref callback) = self.progress {
                        callback.on_progress(current, &path.to_string_lossy());
                    }
                    info
                })
                .collect()
        });

        if let Some(ref callback) = self.progress {
            callback.on_phase_end(COVERS_PHASE);
        }
        Ok(infos)
    }

    /// Read the title and cover of one archive. Never fails: problems are
    /// logged and leave the corresponding field empty.
    fn prepare_album(&self, path: &Path) -> AlbumInfo {
        let mut archive = match Archive::open(path) {
            Ok(archive) => archive,
            Err(e) => {
                log::warn!("Failed to open archive: {}", e);
                return AlbumInfo::default();
            }
        };

        let title = metadata::extract(&mut archive).and_then(|info| info.display_title());
        let pages = archive.page_count();

        let key = self.cache.key(entry_id(path));
        let cover = if let Some(cover) = self.cache.get(key) {
            Some(cover)
        } else if pages == 0 {
            log::warn!("No images found in: {}", path.display());
            None
        } else {
            let page = archive.image_pages()[0].clone();
            match archive.extract_page(0) {
                Ok(data) => match self.cache.populate(key, &data, ThumbnailFormat::Jpeg) {
                    Ok(cover) => Some(cover),
                    Err(e) => {
                        log::warn!(
                            "Failed to make cover from {} in {}: {}",
                            page,
                            path.display(),
                            e
                        );
                        None
                    }
                },
                Err(e) => {
                    log::warn!("{}", e);
                    None
                }
            }
        };

        archive.close();
        AlbumInfo {
            title,
            cover,
            pages,
        }
    }

    /// Cached folder thumbnail, generated from the placeholder on first use.
    fn folder_cover(&self) -> Option<Vec<u8>> {
        let key = self.cache.key(FOLDER_COVER_ID);
        match self
            .cache
            .get_or_populate(key, ThumbnailFormat::Png, || self.placeholder.bytes())
        {
            Ok(cover) => Some(cover),
            Err(e) => {
                log::error!("Failed to prepare folder cover: {}", e);
                None
            }
        }
    }
}
