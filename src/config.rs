//! Configuration types for auto-extract

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Quiet period a file must go without events before it is considered stable
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_secs(2);

/// Top-level configuration
///
/// The watched directory is resolved once at startup and handed to the
/// service; nothing downstream looks it up on its own.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Directory to watch (default: the platform downloads directory)
    #[serde(default = "default_watch_dir")]
    pub watch_dir: PathBuf,

    /// Quiet period before a file is treated as fully arrived (default: 2s)
    #[serde(default = "default_quiet_period", with = "duration_millis_serde")]
    pub quiet_period: Duration,

    /// Send desktop notifications (default: true)
    ///
    /// When disabled, or when no notification binary is available, messages
    /// are written to the log instead.
    #[serde(default = "default_true")]
    pub notifications: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            watch_dir: default_watch_dir(),
            quiet_period: default_quiet_period(),
            notifications: true,
        }
    }
}

impl Config {
    /// Config watching `watch_dir` with every other setting defaulted
    pub fn for_dir(watch_dir: impl Into<PathBuf>) -> Self {
        Self {
            watch_dir: watch_dir.into(),
            ..Default::default()
        }
    }

    /// Check settings that serde defaults cannot guard
    pub fn validate(&self) -> Result<()> {
        if self.watch_dir.as_os_str().is_empty() {
            return Err(Error::Config {
                message: "watch directory must not be empty".to_string(),
                key: Some("watch_dir".to_string()),
            });
        }
        if self.quiet_period.is_zero() {
            return Err(Error::Config {
                message: "quiet period must be greater than zero".to_string(),
                key: Some("quiet_period".to_string()),
            });
        }
        Ok(())
    }
}

fn default_watch_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("Downloads"))
}

fn default_quiet_period() -> Duration {
    DEFAULT_QUIET_PERIOD
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (milliseconds)
mod duration_millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
