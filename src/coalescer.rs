//! Event coalescing for noisy download streams
//!
//! A download produces a burst of create/write notifications, often spread
//! across a sidecar file and the final name. The coalescer keys every
//! qualifying event by its logical name and only reports the file once no
//! event for that name has arrived for a full quiet period.
//!
//! The debounce table is owned by a single task. Raw events arrive over a
//! channel and quiet-period timers live in a [`DelayQueue`] polled by the
//! same task, so inserts, resets and expirations are serialized without a
//! lock. An expired entry is removed from the table before its stable signal
//! is sent, and a later event for the same name starts a fresh cycle.

use crate::classify::{Classification, classify};
use crate::types::{RawEvent, StableFile};
use futures::StreamExt;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::time::DelayQueue;
use tokio_util::time::delay_queue::Key;
use tracing::{debug, info};

/// Pending debounce entry for one logical name
struct PendingEntry {
    /// Timer slot in the delay queue
    key: Key,
    /// Most recent event seen for the logical name
    last_event: RawEvent,
}

/// Debounce table plus its quiet-period timers
pub struct Coalescer {
    quiet_period: Duration,
    pending: HashMap<PathBuf, PendingEntry>,
    timers: DelayQueue<PathBuf>,
}

impl Coalescer {
    /// Create an empty coalescer
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            pending: HashMap::new(),
            timers: DelayQueue::new(),
        }
    }

    /// Feed one raw event into the table
    ///
    /// Returns `false` when the event was filtered out (irrelevant kind or an
    /// ignorable path) and left the table untouched. A qualifying event for a
    /// name that is already pending resets that name's timer to the full
    /// quiet period and replaces the stored event.
    pub fn observe(&mut self, event: RawEvent) -> bool {
        if !event.is_relevant() {
            return false;
        }
        let Classification::Qualify(logical_name) = classify(&event.path) else {
            debug!(path = ?event.path, "ignoring in-progress artifact");
            return false;
        };

        match self.pending.entry(logical_name) {
            Entry::Occupied(mut occupied) => {
                self.timers.reset(&occupied.get().key, self.quiet_period);
                debug!(
                    logical_name = ?occupied.key(),
                    path = ?event.path,
                    "quiet period reset"
                );
                occupied.get_mut().last_event = event;
            }
            Entry::Vacant(vacant) => {
                let key = self.timers.insert(vacant.key().clone(), self.quiet_period);
                debug!(
                    logical_name = ?vacant.key(),
                    path = ?event.path,
                    "quiet period started"
                );
                vacant.insert(PendingEntry {
                    key,
                    last_event: event,
                });
            }
        }
        true
    }

    /// Wait for the next logical name whose quiet period elapsed
    ///
    /// Resolves to `None` immediately when nothing is pending.
    pub async fn next_stable(&mut self) -> Option<StableFile> {
        loop {
            let expired = self.timers.next().await?;
            let logical_name = expired.into_inner();
            // Every timer has a table entry; skip defensively if not.
            if let Some(entry) = self.pending.remove(&logical_name) {
                return Some(StableFile {
                    logical_name,
                    path: entry.last_event.path,
                });
            }
        }
    }

    /// Number of logical names waiting out their quiet period
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no logical name is pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Run the coalescer until the raw event stream closes
    ///
    /// Stable files are forwarded to `stable_tx`. Names still pending when
    /// the stream closes are dropped.
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<RawEvent>,
        stable_tx: mpsc::UnboundedSender<StableFile>,
    ) {
        info!(quiet_period = ?self.quiet_period, "coalescer started");

        loop {
            tokio::select! {
                received = events.recv() => match received {
                    Some(event) => {
                        self.observe(event);
                    }
                    None => break,
                },
                Some(stable) = self.next_stable(), if !self.is_empty() => {
                    debug!(path = ?stable.path, logical_name = ?stable.logical_name, "file stable");
                    if stable_tx.send(stable).is_err() {
                        break;
                    }
                }
            }
        }

        info!(dropped = self.len(), "coalescer stopped");
    }

    /// Spawn the coalescer as its own task
    ///
    /// Returns the raw event sender, the stable file receiver, and the task
    /// handle. Dropping the sender shuts the task down.
    pub fn spawn(
        quiet_period: Duration,
    ) -> (
        mpsc::UnboundedSender<RawEvent>,
        mpsc::UnboundedReceiver<StableFile>,
        JoinHandle<()>,
    ) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (stable_tx, stable_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(Self::new(quiet_period).run(event_rx, stable_tx));
        (event_tx, stable_rx, handle)
    }
}
