//! Ctrl+C handling and cooperative shutdown.
//!
//! A [`ShutdownHandler`] wraps a shared `AtomicBool`. The Ctrl+C hook sets
//! it; the periodic rescan thread and the `watch` command poll it between
//! ticks so that an interrupt stops the process within one tick instead of
//! one full rescan interval.
//!
//! ```rust,no_run
//! use jomics::signal::install_handler;
//! use std::time::Duration;
//!
//! let handler = install_handler()?;
//! while handler.sleep(Duration::from_secs(300)) {
//!     // rescan
//! }
//! # Ok::<(), jomics::signal::SignalError>(())
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

/// Exit code for SIGINT: 128 + 2.
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Longest uninterrupted sleep in [`ShutdownHandler::sleep`].
pub const POLL_TICK: Duration = Duration::from_millis(100);

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// A handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request shutdown. Every clone observes it.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// The underlying flag.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// Sleep for `duration`, waking early on shutdown.
    ///
    /// Returns `true` if the full duration elapsed and `false` if shutdown
    /// was requested before or during the sleep.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_shutdown_requested() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep((deadline - now).min(POLL_TICK));
        }
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C hook and return its handler.
///
/// Later calls reuse the installed handler after clearing its flag, so
/// `run_app` can be called repeatedly in one process (as tests do).
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] if another component already
/// owns the Ctrl+C hook.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = GLOBAL_HANDLER.get_or_init(ShutdownHandler::new).clone();
    let flag = handler.get_flag();
    let installed = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Stopping...");
        log::info!("Shutdown signal received");
    });

    match installed {
        Ok(()) => Ok(handler),
        Err(ctrlc::Error::MultipleHandlers) => {
            log::debug!("Ctrl+C handler already registered, using unhooked handler");
            Ok(handler)
        }
        Err(e) => Err(e.into()),
    }
}
