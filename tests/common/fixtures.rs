//! Archive fixtures and a running service harness

use async_trait::async_trait;
use auto_extract::{AutoExtractor, Config, Event, Icon, Notifier};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Quiet period used by integration tests
pub const TEST_QUIET_PERIOD: Duration = Duration::from_millis(300);

/// Build zip bytes from `(name, content)` pairs
pub fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, content) in files {
        writer.start_file(*name, options).expect("start zip entry");
        writer.write_all(content).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// Write `bytes` to `path` in a few chunks, pausing between them
pub async fn write_in_chunks(path: &Path, bytes: &[u8], pause: Duration) {
    let mut file = std::fs::File::create(path).expect("create download file");
    for chunk in bytes.chunks(bytes.len().div_ceil(4).max(1)) {
        file.write_all(chunk).expect("write chunk");
        file.flush().expect("flush chunk");
        tokio::time::sleep(pause).await;
    }
}

/// Notifier that records every message it is asked to show
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(String, Icon)>>,
}

impl RecordingNotifier {
    /// Snapshot of recorded `(body, icon)` pairs
    pub fn messages(&self) -> Vec<(String, Icon)> {
        self.messages.lock().expect("notifier lock poisoned").clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, _title: &str, body: &str, icon: Icon) -> auto_extract::Result<()> {
        self.messages
            .lock()
            .expect("notifier lock poisoned")
            .push((body.to_string(), icon));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// A service watching a temporary downloads directory
pub struct Harness {
    /// Keeps the directory alive for the test
    pub temp_dir: TempDir,
    /// Directory being watched
    pub watch_dir: PathBuf,
    /// Lifecycle events
    pub events: broadcast::Receiver<Event>,
    /// Messages sent to the user
    pub notifier: Arc<RecordingNotifier>,
    shutdown: CancellationToken,
    task: JoinHandle<auto_extract::Result<()>>,
}

impl Harness {
    /// Start the service on a fresh directory
    pub async fn start() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let watch_dir = temp_dir.path().join("Downloads");
        let notifier = Arc::new(RecordingNotifier::default());

        let mut config = Config::for_dir(&watch_dir);
        config.quiet_period = TEST_QUIET_PERIOD;
        let extractor = AutoExtractor::new(config, notifier.clone()).expect("build service");
        let events = extractor.subscribe();

        let shutdown = CancellationToken::new();
        let token = shutdown.clone();
        let task = tokio::spawn(async move { extractor.run(token).await });

        // give the watcher time to register
        for _ in 0..50 {
            if watch_dir.is_dir() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;

        Self {
            temp_dir,
            watch_dir,
            events,
            notifier,
            shutdown,
            task,
        }
    }

    /// Path of a file inside the watched directory
    pub fn path(&self, name: &str) -> PathBuf {
        self.watch_dir.join(name)
    }

    /// Stop the service and wait for it to finish
    pub async fn stop(self) {
        self.shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(10), self.task)
            .await
            .expect("service did not stop")
            .expect("service task panicked")
            .expect("service returned an error");
    }
}
