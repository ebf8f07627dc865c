//! Desktop notifications for extraction progress
//!
//! Notifications are fire-and-forget from the pipeline's point of view: a
//! failed notification is logged and never aborts an extraction.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::info;

/// Title used for every notification
pub const NOTIFICATION_TITLE: &str = "AutoExtractor";

/// Icon hint attached to a notification
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Icon {
    /// Extraction is starting
    Download,
    /// Extraction finished
    Extracted,
    /// Extraction failed
    Error,
}

impl Icon {
    /// Freedesktop icon name for the hint
    pub fn as_str(self) -> &'static str {
        match self {
            Icon::Download => "folder-download",
            Icon::Extracted => "package-x-generic",
            Icon::Error => "dialog-error",
        }
    }
}

/// Trait for showing a message to the user
///
/// # Examples
///
/// ```no_run
/// use auto_extract::notifier::{DesktopNotifier, Icon, LogNotifier, Notifier};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let notifier: Arc<dyn Notifier> = match DesktopNotifier::from_path() {
///     Some(desktop) => Arc::new(desktop),
///     None => Arc::new(LogNotifier),
/// };
/// notifier.notify("AutoExtractor", "extracting movie.zip", Icon::Download).await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Show a message
    ///
    /// # Errors
    ///
    /// Returns [`Error::Notification`] if the message could not be delivered.
    async fn notify(&self, title: &str, body: &str, icon: Icon) -> Result<()>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Notifier backed by the freedesktop `notify-send` binary
pub struct DesktopNotifier {
    binary_path: PathBuf,
}

impl DesktopNotifier {
    /// Create a notifier with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find `notify-send` in PATH
    pub fn from_path() -> Option<Self> {
        which::which("notify-send").ok().map(Self::new)
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, title: &str, body: &str, icon: Icon) -> Result<()> {
        let output = Command::new(&self.binary_path)
            .arg("--icon")
            .arg(icon.as_str())
            .arg(title)
            .arg(body)
            .output()
            .await
            .map_err(|e| Error::Notification(format!("failed to execute notify-send: {}", e)))?;

        if !output.status.success() {
            return Err(Error::Notification(format!(
                "notify-send exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "notify-send"
    }
}

/// Notifier that writes messages to the log
///
/// Used when notifications are disabled or no desktop binary is available.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, title: &str, body: &str, icon: Icon) -> Result<()> {
        info!(title, icon = icon.as_str(), "{}", body);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
