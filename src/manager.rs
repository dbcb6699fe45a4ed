//! Ownership of the current index and periodic rescans.
//!
//! The [`IndexManager`] holds an `Arc<CollectionIndex>` behind a lock that
//! is only ever taken to clone or swap the pointer. A rescan builds a
//! complete new index without touching the lock and then publishes it in
//! one swap, so readers always see either the old snapshot or the new one.
//!
//! ```rust,no_run
//! use jomics::manager::IndexManager;
//! use jomics::scanner::{CollectionScanner, ScannerConfig};
//! use jomics::signal::ShutdownHandler;
//! use jomics::thumbnail::ThumbnailCache;
//! use std::path::Path;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let cache = ThumbnailCache::new(Path::new("/tmp/jomics-cache"), 400)?;
//! let scanner = CollectionScanner::new(ScannerConfig::default(), cache);
//! let manager = Arc::new(IndexManager::start(scanner, Path::new("/comics"))?);
//! let handle = manager.spawn_periodic(Duration::from_secs(300), ShutdownHandler::new());
//! println!("{} entries", manager.current().len());
//! handle.stop();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};

use crate::index::CollectionIndex;
use crate::scanner::{CollectionScanner, ScanError};
use crate::signal::ShutdownHandler;

/// Shares the latest [`CollectionIndex`] between readers and the rescan
/// thread.
#[derive(Debug)]
pub struct IndexManager {
    scanner: CollectionScanner,
    root: PathBuf,
    current: RwLock<Arc<CollectionIndex>>,
    generation: AtomicU64,
    // Serializes rescans; readers never take it.
    scan_lock: Mutex<()>,
}

impl IndexManager {
    /// Scan `root` once and start managing the result.
    ///
    /// # Errors
    ///
    /// Returns the [`ScanError`] of the initial scan; there is no previous
    /// index to fall back to.
    pub fn start(scanner: CollectionScanner, root: &Path) -> Result<Self, ScanError> {
        let started = Instant::now();
        let index = scanner.scan(root)?;
        log::info!(
            "Initial scan finished in {:.2?}: {} entries",
            started.elapsed(),
            index.len()
        );
        Ok(Self {
            scanner,
            root: root.to_path_buf(),
            current: RwLock::new(Arc::new(index)),
            generation: AtomicU64::new(1),
            scan_lock: Mutex::new(()),
        })
    }

    /// The collection root being managed.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The scanner used for rescans.
    #[must_use]
    pub fn scanner(&self) -> &CollectionScanner {
        &self.scanner
    }

    /// The latest published index.
    ///
    /// The returned snapshot stays valid and unchanged however many
    /// rescans happen while it is held.
    #[must_use]
    pub fn current(&self) -> Arc<CollectionIndex> {
        Arc::clone(&self.current.read())
    }

    /// Number of indexes published so far, including the initial one.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Scan again and publish the result.
    ///
    /// On failure the previous index stays current.
    ///
    /// # Errors
    ///
    /// Returns the [`ScanError`] of the failed scan.
    pub fn rescan(&self) -> Result<Arc<CollectionIndex>, ScanError> {
        let _guard = self.scan_lock.lock();
        let started = Instant::now();

        let index = match self.scanner.scan(&self.root) {
            Ok(index) => Arc::new(index),
            Err(e) => {
                log::error!("Rescan of {} failed, keeping previous index: {}", self.root.display(), e);
                return Err(e);
            }
        };

        *self.current.write() = Arc::clone(&index);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        log::info!(
            "Rescan {} finished in {:.2?}: {} entries",
            generation,
            started.elapsed(),
            index.len()
        );
        Ok(index)
    }

    /// Rescan every `interval` on a background thread until `shutdown` is
    /// requested or the returned handle is stopped.
    ///
    /// A zero interval disables periodic rescans: the returned handle has
    /// no thread.
    #[must_use]
    pub fn spawn_periodic(self: &Arc<Self>, interval: Duration, shutdown: ShutdownHandler) -> RescanHandle {
        if interval.is_zero() {
            log::debug!("Periodic rescans disabled");
            return RescanHandle {
                shutdown,
                thread: None,
            };
        }

        let manager = Arc::clone(self);
        let stop = shutdown.clone();
        let thread = std::thread::Builder::new()
            .name("jomics-rescan".into())
            .spawn(move || {
                log::debug!("Rescanning every {:?}", interval);
                while stop.sleep(interval) {
                    // Errors are logged by rescan; keep the loop alive.
                    let _ = manager.rescan();
                }
                log::debug!("Rescan thread stopped");
            });

        let thread = match thread {
            Ok(thread) => Some(thread),
            Err(e) => {
                log::error!("Failed to start rescan thread: {}", e);
                None
            }
        };
        RescanHandle { shutdown, thread }
    }
}

/// Handle to the periodic rescan thread.
#[derive(Debug)]
pub struct RescanHandle {
    shutdown: ShutdownHandler,
    thread: Option<JoinHandle<()>>,
}

impl RescanHandle {
    /// Whether a rescan thread is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Wait for the thread to exit on its own (after shutdown is requested
    /// elsewhere).
    pub fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Rescan thread panicked");
            }
        }
    }

    /// Request shutdown and wait for the thread.
    ///
    /// A scan in progress finishes first.
    pub fn stop(self) {
        self.shutdown.request_shutdown();
        self.join();
    }
}
