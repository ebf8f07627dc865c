//! # auto-extract
//!
//! Watches a downloads directory and unpacks archives once they have finished
//! arriving.
//!
//! ## How it works
//!
//! - A non-recursive watcher reports creations and modifications in the
//!   directory
//! - Temporary download artifacts (`.tmp`, `.opdownload`) are ignored and
//!   tokenized `.part` sidecars are folded into their final name
//! - A file is considered complete once no event touched its name for the
//!   quiet period (2 s by default)
//! - Zip, 7z, RAR and tar.gz archives are extracted into a sibling directory
//!   named after the archive, and the archive is moved into it
//!
//! ## Quick Start
//!
//! ```no_run
//! use auto_extract::{AutoExtractor, Config, run_with_shutdown};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let extractor = AutoExtractor::with_default_notifier(Config::default())?;
//!
//!     // Subscribe to events
//!     let mut events = extractor.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     run_with_shutdown(extractor).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Download name classification
pub mod classify;
/// Quiet-period debouncing of raw events
pub mod coalescer;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Archive extraction
pub mod extraction;
/// Desktop notifications
pub mod notifier;
/// Per-file extraction pipeline
pub mod pipeline;
/// Core types and events
pub mod types;
/// Filesystem watching
pub mod watcher;

// Re-export commonly used types
pub use coalescer::Coalescer;
pub use config::Config;
pub use error::{Error, ExtractionError, Result};
pub use notifier::{DesktopNotifier, Icon, LogNotifier, Notifier};
pub use pipeline::{ExtractionPipeline, Outcome, SkipReason};
pub use types::{ArchiveKind, Event, ExtractionJob, RawEvent, RawEventKind, StableFile};
pub use watcher::DownloadWatcher;

use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Capacity of the lifecycle event channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// The watch-debounce-extract service
///
/// Owns the configuration, the extraction pipeline and the lifecycle event
/// channel. [`AutoExtractor::run`] wires the watcher, the coalescer and the
/// pipeline together and drives them until cancelled.
pub struct AutoExtractor {
    config: Config,
    pipeline: Arc<ExtractionPipeline>,
    event_tx: broadcast::Sender<Event>,
}

impl AutoExtractor {
    /// Create a new service with an explicit notifier
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the configuration is invalid
    pub fn new(config: Config, notifier: Arc<dyn Notifier>) -> Result<Self> {
        config.validate()?;

        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let pipeline = Arc::new(ExtractionPipeline::new(notifier, event_tx.clone()));

        Ok(Self {
            config,
            pipeline,
            event_tx,
        })
    }

    /// Create a new service, picking the notifier from the configuration
    ///
    /// Uses `notify-send` when notifications are enabled and the binary is on
    /// `PATH`, and falls back to logging otherwise.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the configuration is invalid
    pub fn with_default_notifier(config: Config) -> Result<Self> {
        let notifier: Arc<dyn Notifier> = if !config.notifications {
            info!("Desktop notifications disabled");
            Arc::new(LogNotifier)
        } else if let Some(desktop) = DesktopNotifier::from_path() {
            Arc::new(desktop)
        } else {
            warn!("notify-send not found in PATH, notifications will only be logged");
            Arc::new(LogNotifier)
        };
        Self::new(config, notifier)
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Watch the configured directory until `shutdown` is cancelled
    ///
    /// Each stable file is handed to the pipeline on its own task. Jobs that
    /// are already running are awaited before returning; names still waiting
    /// out their quiet period are dropped.
    ///
    /// # Errors
    /// Returns [`Error::Watch`] if the directory cannot be created or watched
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        let mut watcher = DownloadWatcher::new(&self.config.watch_dir)?;
        watcher.start()?;

        let (raw_tx, mut stable_rx, coalescer) = Coalescer::spawn(self.config.quiet_period);
        let watch_task = tokio::spawn(watcher.run(raw_tx));
        let mut jobs = JoinSet::new();

        info!(
            watch_dir = %self.config.watch_dir.display(),
            quiet_period = ?self.config.quiet_period,
            "auto-extract running"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested");
                    break;
                }
                stable = stable_rx.recv() => match stable {
                    Some(stable) => {
                        self.event_tx
                            .send(Event::FileStable {
                                path: stable.path.clone(),
                            })
                            .ok();
                        let pipeline = Arc::clone(&self.pipeline);
                        jobs.spawn(async move {
                            // failures are already reported by the pipeline
                            let _ = pipeline.handle(&stable.path).await;
                        });
                    }
                    None => {
                        warn!("Event stream closed");
                        break;
                    }
                },
                Some(joined) = jobs.join_next(), if !jobs.is_empty() => {
                    report_job_failure(&joined);
                }
            }
        }

        // dropping the watcher closes the raw channel, which stops the coalescer
        watch_task.abort();
        let _ = watch_task.await;
        let _ = coalescer.await;

        if !jobs.is_empty() {
            info!(in_flight = jobs.len(), "Waiting for running extractions");
        }
        while let Some(joined) = jobs.join_next().await {
            report_job_failure(&joined);
        }

        info!("auto-extract stopped");
        Ok(())
    }
}

/// Log a pipeline task that panicked or was cancelled
///
/// Returns `true` when the task did not finish normally.
fn report_job_failure(joined: &std::result::Result<(), JoinError>) -> bool {
    match joined {
        Ok(()) => false,
        Err(e) => {
            warn!(error = %e, panicked = e.is_panic(), "extraction task did not finish");
            true
        }
    }
}

/// Helper function to run the service with graceful signal handling.
///
/// Runs until a termination signal arrives, then lets running extractions
/// finish before returning.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use auto_extract::{AutoExtractor, Config, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let extractor = AutoExtractor::with_default_notifier(Config::default())?;
///     run_with_shutdown(extractor).await?;
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(extractor: AutoExtractor) -> Result<()> {
    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.cancel();
    });
    extractor.run(shutdown).await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // registration may fail in restricted environments (containers, tests)
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM signal"),
                _ = sigint.recv() => info!("Received SIGINT signal (Ctrl+C)"),
            }
        }
        (Err(e), Ok(mut sigint)) => {
            warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C signal"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C signal"),
    }
}
