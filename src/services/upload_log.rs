//! Append-only upload log.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::io;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Records one line per successful upload, timestamped in the configured
/// timezone.
pub struct UploadLog {
    path: PathBuf,
    timezone: Tz,
}

impl UploadLog {
    pub fn new(path: impl Into<PathBuf>, timezone: Tz) -> Self {
        Self {
            path: path.into(),
            timezone,
        }
    }

    pub async fn record(&self, original_name: &str) -> io::Result<()> {
        let line = Self::format_line(original_name, Utc::now(), self.timezone);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        Ok(())
    }

    fn format_line(name: &str, at: DateTime<Utc>, timezone: Tz) -> String {
        format!(
            "Uploaded \"{}\" @ {}\n",
            name,
            at.with_timezone(&timezone).format("%-I:%M %p %m/%d/%Y")
        )
    }
}
