use chrono_tz::Tz;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Service configuration, passed to handlers through `AppState` rather than
/// read from ambient globals.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory derived artifacts are written to (default: `uploads`)
    pub storage_dir: PathBuf,

    /// Append-only upload log path (default: `upload.log`)
    pub upload_log: PathBuf,

    /// How long a derived artifact lives before deletion (default: 60 s)
    pub delete_delay: Duration,

    /// Pitch step of the transform in whole tones (default: 1.0)
    pub tones: f32,

    /// Maximum request body size in bytes (default: 100 MB)
    pub max_file_size: usize,

    /// Timezone for upload-log timestamps (default: America/Chicago)
    pub timezone: Tz,

    /// Listen address (default: 127.0.0.1:3000)
    pub bind_addr: SocketAddr,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("uploads"),
            upload_log: PathBuf::from("upload.log"),
            delete_delay: Duration::from_secs(60),
            tones: 1.0,
            max_file_size: 100 * 1024 * 1024, // 100 MB
            timezone: chrono_tz::America::Chicago,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            storage_dir: env::var("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.storage_dir),

            upload_log: env::var("UPLOAD_LOG")
                .map(PathBuf::from)
                .unwrap_or(default.upload_log),

            delete_delay: env::var("DELETE_DELAY_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.delete_delay),

            tones: env::var("NIGHTCORE_TONES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.tones),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            timezone: env::var("UPLOAD_LOG_TZ")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.timezone),

            bind_addr: env::var("BIND_ADDR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.bind_addr),
        }
    }

    /// Create config for local development (artifacts expire quickly)
    pub fn development() -> Self {
        Self {
            delete_delay: Duration::from_secs(10),
            ..Self::default()
        }
    }
}
