//! Filesystem watching for the downloads directory
//!
//! Wraps a non-recursive [`notify`] watcher and translates its events into
//! [`RawEvent`]s for the coalescer:
//! - `Create` and renames landing in the directory become `Created`
//! - content and metadata changes become `Modified`
//! - removals, renames away and access notifications become `Other`

use crate::error::{Error, Result};
use crate::types::{RawEvent, RawEventKind};
use notify::event::{ModifyKind, RenameMode};
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Watches a single directory and forwards raw events
pub struct DownloadWatcher {
    /// Filesystem watcher instance
    watcher: RecommendedWatcher,

    /// Channel for receiving filesystem events
    rx: mpsc::UnboundedReceiver<notify::Result<Event>>,

    /// Directory being watched
    watch_dir: PathBuf,
}

impl DownloadWatcher {
    /// Create a new watcher for `watch_dir`
    ///
    /// # Errors
    /// Returns error if the filesystem watcher cannot be initialized
    pub fn new(watch_dir: impl Into<PathBuf>) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let watcher = RecommendedWatcher::new(
            move |res| {
                if let Err(e) = tx.send(res) {
                    error!("Failed to send filesystem event: {}", e);
                }
            },
            NotifyConfig::default(),
        )?;

        Ok(Self {
            watcher,
            rx,
            watch_dir: watch_dir.into(),
        })
    }

    /// Directory being watched
    pub fn watch_dir(&self) -> &Path {
        &self.watch_dir
    }

    /// Start watching the directory, creating it if it does not exist
    ///
    /// # Errors
    /// Returns error if the directory cannot be created or watched
    pub fn start(&mut self) -> Result<()> {
        if !self.watch_dir.exists() {
            std::fs::create_dir_all(&self.watch_dir)
                .map_err(|e| Error::Watch(format!("Failed to create watch folder: {}", e)))?;
            info!("Created watch folder: {}", self.watch_dir.display());
        }

        self.watcher
            .watch(&self.watch_dir, RecursiveMode::NonRecursive)
            .map_err(|e| Error::Watch(format!("Failed to watch folder: {}", e)))?;

        info!("Watching folder: {}", self.watch_dir.display());
        Ok(())
    }

    /// Forward events until either channel closes
    ///
    /// Watcher errors are logged and do not stop the loop.
    pub async fn run(mut self, raw_tx: mpsc::UnboundedSender<RawEvent>) {
        info!("Folder watcher started");

        while let Some(result) = self.rx.recv().await {
            match result {
                Ok(event) => {
                    for raw in raw_events(&event) {
                        if raw_tx.send(raw).is_err() {
                            info!("Folder watcher stopped: coalescer closed");
                            return;
                        }
                    }
                }
                Err(e) => {
                    error!("Filesystem watcher error: {}", e);
                }
            }
        }

        info!("Folder watcher stopped");
    }
}

/// Translate a notify event into raw events, one per relevant path
pub fn raw_events(event: &Event) -> Vec<RawEvent> {
    let raw = |path: &PathBuf, kind: RawEventKind| RawEvent {
        path: path.clone(),
        kind,
    };

    let events: Vec<RawEvent> = match &event.kind {
        EventKind::Create(_) => event
            .paths
            .iter()
            .map(|p| raw(p, RawEventKind::Created))
            .collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => event
            .paths
            .iter()
            .map(|p| raw(p, RawEventKind::Created))
            .collect(),
        // paths are [from, to]; only the destination is still in the directory
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => event
            .paths
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let kind = if i == 0 {
                    RawEventKind::Other
                } else {
                    RawEventKind::Created
                };
                raw(p, kind)
            })
            .collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => event
            .paths
            .iter()
            .map(|p| raw(p, RawEventKind::Other))
            .collect(),
        // Backends that cannot tell the rename direction (FSEvents) report
        // both ends; only the one that still exists counts as a creation.
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .map(|p| {
                let kind = if p.exists() {
                    RawEventKind::Created
                } else {
                    RawEventKind::Other
                };
                raw(p, kind)
            })
            .collect(),
        EventKind::Modify(_) => event
            .paths
            .iter()
            .map(|p| raw(p, RawEventKind::Modified))
            .collect(),
        _ => event
            .paths
            .iter()
            .map(|p| raw(p, RawEventKind::Other))
            .collect(),
    };

    debug!(kind = ?event.kind, count = events.len(), "translated filesystem event");
    events
}
