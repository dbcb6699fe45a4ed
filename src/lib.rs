//! jomics - comic archive collection index
//!
//! Walks a directory tree of comic archives (`.cbz` zip, `.cbr` rar), gives
//! every folder and archive a stable 32-bit id, titles archives from their
//! embedded `ComicInfo.xml` or their file names, and keeps a disk cache of
//! cover thumbnails. The index is an immutable snapshot replaced wholesale
//! by periodic rescans.

pub mod app;
pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod library;
pub mod logging;
pub mod manager;
pub mod metadata;
pub mod progress;
pub mod scanner;
pub mod signal;
pub mod thumbnail;

pub use app::run_app;
