//! Disk-backed cache of generated cover thumbnails.
//!
//! Thumbnails are keyed by `(id, height)`. The key is encoded entirely in the
//! cache file name (`{id:08x}-{height}`), so starting with a different
//! thumbnail height simply stops referencing the old files; nothing is ever
//! evicted.
//!
//! # Write Safety
//!
//! Every write goes to a temporary file in the cache directory which is then
//! renamed over the final name. Readers never observe a torn file, and two
//! writers racing on the same key write identical bytes.
//!
//! # Example
//!
//! ```no_run
//! use jomics::thumbnail::{ThumbnailCache, ThumbnailFormat};
//! use std::path::Path;
//!
//! let cache = ThumbnailCache::new(Path::new("/tmp/jomics-cache"), 400)?;
//! let key = cache.key(0x1234_abcd);
//! let bytes = cache.get_or_populate(key, ThumbnailFormat::Jpeg, || {
//!     std::fs::read("/tmp/cover.png").map_err(jomics::thumbnail::ThumbnailError::from)
//! })?;
//! assert!(cache.has(key));
//! # let _ = bytes;
//! # Ok::<(), jomics::thumbnail::ThumbnailError>(())
//! ```

pub mod placeholder;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use tempfile::NamedTempFile;

use crate::archive::ArchiveError;

pub use placeholder::{GeneratedFolderIcon, PlaceholderSource, StaticPlaceholder, FOLDER_COVER_ID};

/// Default thumbnail height in pixels.
pub const DEFAULT_THUMB_HEIGHT: u32 = 400;

/// JPEG quality used for archive covers.
pub const JPEG_QUALITY: u8 = 75;

/// Errors that can occur while generating or storing thumbnails.
#[derive(thiserror::Error, Debug)]
pub enum ThumbnailError {
    /// The source image could not be decoded.
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// The resized image could not be encoded.
    #[error("Failed to encode thumbnail: {0}")]
    Encode(#[source] image::ImageError),

    /// The requested thumbnail height is zero.
    #[error("Invalid thumbnail height: {0}")]
    InvalidHeight(u32),

    /// Reading or writing the cache directory failed.
    #[error("Cache I/O error for {path}: {source}")]
    CacheIo {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The source image bytes could not be obtained from an archive.
    #[error(transparent)]
    Source(#[from] ArchiveError),

    /// The source image bytes could not be read.
    #[error("Failed to read source image: {0}")]
    Io(#[from] std::io::Error),
}

/// Output encoding of a thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailFormat {
    /// JPEG, used for archive covers.
    Jpeg,
    /// PNG, used for the folder placeholder.
    Png,
}

/// Cache key: entry id plus thumbnail height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Entry id (path checksum)
    pub id: u32,
    /// Thumbnail height in pixels
    pub height: u32,
}

impl CacheKey {
    /// Create a key.
    #[must_use]
    pub fn new(id: u32, height: u32) -> Self {
        Self { id, height }
    }

    /// The cache file name encoding both key components.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{:08x}-{}", self.id, self.height)
    }

    /// Recover a key from a cache file name.
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (id, height) = name.split_once('-')?;
        if id.len() != 8 {
            return None;
        }
        Some(Self {
            id: u32::from_str_radix(id, 16).ok()?,
            height: height.parse().ok()?,
        })
    }
}

/// Decode `source`, scale it to `height` rows keeping the aspect ratio, and
/// encode it as `format`.
///
/// # Errors
///
/// Returns [`ThumbnailError::Decode`] if `source` is not a supported image,
/// and [`ThumbnailError::Encode`] if encoding fails.
pub fn render(source: &[u8], height: u32, format: ThumbnailFormat) -> Result<Vec<u8>, ThumbnailError> {
    if height == 0 {
        return Err(ThumbnailError::InvalidHeight(height));
    }

    let img = image::load_from_memory(source).map_err(ThumbnailError::Decode)?;
    let width = scaled_width(img.width(), img.height(), height);
    let resized = img.resize_exact(width, height, FilterType::Lanczos3);

    let mut buf = Vec::new();
    let encoded = match format {
        ThumbnailFormat::Jpeg => DynamicImage::ImageRgb8(resized.to_rgb8())
            .write_with_encoder(JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY)),
        ThumbnailFormat::Png => resized.write_with_encoder(PngEncoder::new(&mut buf)),
    };
    encoded.map_err(ThumbnailError::Encode)?;

    Ok(buf)
}

/// Width that keeps the aspect ratio of a `src_width` x `src_height` image
/// at `height` rows. Never less than one pixel.
#[must_use]
pub fn scaled_width(src_width: u32, src_height: u32, height: u32) -> u32 {
    if src_height == 0 {
        return 1;
    }
    let width = (f64::from(src_width) * f64::from(height) / f64::from(src_height)).round();
    (width as u32).max(1)
}

/// Filesystem-backed thumbnail store.
#[derive(Debug, Clone)]
pub struct ThumbnailCache {
    dir: PathBuf,
    height: u32,
}

impl ThumbnailCache {
    /// Open (creating if needed) a cache rooted at `dir` producing
    /// thumbnails `height` pixels tall.
    ///
    /// # Errors
    ///
    /// Returns [`ThumbnailError::CacheIo`] if the directory cannot be created
    /// and [`ThumbnailError::InvalidHeight`] for a zero height.
    pub fn new(dir: &Path, height: u32) -> Result<Self, ThumbnailError> {
        if height == 0 {
            return Err(ThumbnailError::InvalidHeight(height));
        }
        fs::create_dir_all(dir).map_err(|source| ThumbnailError::CacheIo {
            path: dir.to_path_buf(),
            source,
        })?;
        log::debug!("Thumbnail cache at {} (height {})", dir.display(), height);
        Ok(Self {
            dir: dir.to_path_buf(),
            height,
        })
    }

    /// Cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Configured thumbnail height.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Key for `id` at the configured height.
    #[must_use]
    pub fn key(&self, id: u32) -> CacheKey {
        CacheKey::new(id, self.height)
    }

    /// Location of the file backing `key`.
    #[must_use]
    pub fn path_for(&self, key: CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Whether a thumbnail is stored for `key`.
    #[must_use]
    pub fn has(&self, key: CacheKey) -> bool {
        self.path_for(key).is_file()
    }

    /// Stored bytes for `key`, if present.
    #[must_use]
    pub fn get(&self, key: CacheKey) -> Option<Vec<u8>> {
        match fs::read(self.path_for(key)) {
            Ok(data) => Some(data),
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::debug!("Cache read failed for {}: {}", key.file_name(), e);
                }
                None
            }
        }
    }

    /// Store `data` under `key`, replacing any previous value atomically.
    ///
    /// # Errors
    ///
    /// Returns [`ThumbnailError::CacheIo`] if the temporary file cannot be
    /// written or renamed into place.
    pub fn put(&self, key: CacheKey, data: &[u8]) -> Result<(), ThumbnailError> {
        let path = self.path_for(key);
        let cache_io = |source: std::io::Error| ThumbnailError::CacheIo {
            path: path.clone(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(cache_io)?;
        tmp.write_all(data).map_err(cache_io)?;
        tmp.as_file().sync_all().map_err(cache_io)?;
        tmp.persist(&path).map_err(|e| cache_io(e.error))?;
        Ok(())
    }

    /// Render a thumbnail from `source` and store it under `key`.
    ///
    /// A failed write is logged and the rendered bytes are still returned.
    ///
    /// # Errors
    ///
    /// Returns [`ThumbnailError::Decode`] or [`ThumbnailError::Encode`] if
    /// the image cannot be processed.
    pub fn populate(
        &self,
        key: CacheKey,
        source: &[u8],
        format: ThumbnailFormat,
    ) -> Result<Vec<u8>, ThumbnailError> {
        let data = render(source, key.height, format)?;
        if let Err(e) = self.put(key, &data) {
            log::warn!("{}", e);
        }
        Ok(data)
    }

    /// Return the cached thumbnail for `key`, or load the source image with
    /// `load`, populate the cache and return the new thumbnail.
    ///
    /// `load` is not called when `key` is already cached.
    ///
    /// # Errors
    ///
    /// Propagates the error from `load`, or a decode/encode error from
    /// [`populate`](Self::populate).
    pub fn get_or_populate<F, E>(
        &self,
        key: CacheKey,
        format: ThumbnailFormat,
        load: F,
    ) -> Result<Vec<u8>, ThumbnailError>
    where
        F: FnOnce() -> Result<Vec<u8>, E>,
        E: Into<ThumbnailError>,
    {
        if let Some(data) = self.get(key) {
            log::trace!("Cache hit for {}", key.file_name());
            return Ok(data);
        }
        let source = load().map_err(Into::into)?;
        self.populate(key, &source, format)
    }

    /// Keys of every thumbnail in the cache directory, at any height.
    ///
    /// Files that do not follow the key naming scheme are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ThumbnailError::CacheIo`] if the directory cannot be read.
    pub fn keys(&self) -> Result<Vec<CacheKey>, ThumbnailError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| ThumbnailError::CacheIo {
            path: self.dir.clone(),
            source,
        })?;
        let mut keys: Vec<CacheKey> = entries
            .filter_map(Result::ok)
            .filter_map(|e| CacheKey::from_file_name(&e.file_name().to_string_lossy()))
            .collect();
        keys.sort_by_key(|k| (k.id, k.height));
        Ok(keys)
    }
}
