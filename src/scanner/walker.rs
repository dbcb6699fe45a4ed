//! Directory walker producing the nodes of a collection.
//!
//! # Overview
//!
//! The [`Walker`] visits the tree below a root depth-first with every
//! directory's children sorted by file name. That order is the listing order
//! of the collection, so it must be deterministic across scans of an
//! unchanged tree.
//!
//! The root itself must be a readable directory; anything else is a
//! [`ScanError`]. Errors further down (an unreadable subdirectory, a file
//! that vanished mid-walk) are logged and skipped.
//!
//! # Example
//!
//! ```no_run
//! use jomics::scanner::{Walker, ScannerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/comics"), &ScannerConfig::default());
//! for node in walker.walk()? {
//!     println!("{} {}", if node.is_dir { "D" } else { "F" }, node.path.display());
//! }
//! # Ok::<(), jomics::scanner::ScanError>(())
//! ```

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{ScanError, ScannerConfig};

/// A directory or comic archive found during a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Absolute path
    pub path: PathBuf,
    /// Whether the node is a directory
    pub is_dir: bool,
}

/// Depth-first, name-sorted walker over a collection root.
#[derive(Debug)]
pub struct Walker {
    root: PathBuf,
    follow_symlinks: bool,
    skip_hidden: bool,
    extensions: Vec<String>,
}

impl Walker {
    /// Create a walker for `root` using the filters in `config`.
    #[must_use]
    pub fn new(root: &Path, config: &ScannerConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            follow_symlinks: config.follow_symlinks,
            skip_hidden: config.skip_hidden,
            extensions: config
                .archive_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    /// Whether `path` has one of the configured archive extensions.
    #[must_use]
    pub fn is_archive(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.extensions.iter().any(|e| *e == ext)
            })
    }

    /// Verify that the root is a readable directory.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NotFound`], [`ScanError::PermissionDenied`],
    /// [`ScanError::NotADirectory`] or [`ScanError::Io`].
    pub fn check_root(&self) -> Result<(), ScanError> {
        let metadata = std::fs::metadata(&self.root).map_err(|e| self.root_error(e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(self.root.clone()));
        }
        std::fs::read_dir(&self.root).map_err(|e| self.root_error(e))?;
        Ok(())
    }

    fn root_error(&self, e: std::io::Error) -> ScanError {
        match e.kind() {
            std::io::ErrorKind::NotFound => ScanError::NotFound(self.root.clone()),
            std::io::ErrorKind::PermissionDenied => ScanError::PermissionDenied(self.root.clone()),
            _ => ScanError::Io {
                path: self.root.clone(),
                source: e,
            },
        }
    }

    fn is_hidden(entry: &walkdir::DirEntry) -> bool {
        entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
    }

    /// Walk the tree and return its directories and archives in walk order.
    ///
    /// The root itself is not included. Files that are not archives are
    /// skipped silently.
    ///
    /// # Errors
    ///
    /// Fails only if the root cannot be read (see [`check_root`](Self::check_root)).
    pub fn walk(&self) -> Result<Vec<Node>, ScanError> {
        self.check_root()?;

        let skip_hidden = self.skip_hidden;
        let walk = WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(self.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |e| !(skip_hidden && Self::is_hidden(e)));

        let mut nodes = Vec::new();
        for entry in walk {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map_or_else(|| self.root.clone(), Path::to_path_buf);
                    log::warn!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                nodes.push(Node {
                    path: entry.into_path(),
                    is_dir: true,
                });
            } else if file_type.is_file() && self.is_archive(entry.path()) {
                nodes.push(Node {
                    path: entry.into_path(),
                    is_dir: false,
                });
            } else {
                log::trace!("Ignoring {}", entry.path().display());
            }
        }

        log::debug!(
            "Walked {}: {} nodes",
            self.root.display(),
            nodes.len()
        );
        Ok(nodes)
    }
}
