//! Local artifact storage.

use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use uuid::Uuid;

/// Storage seam for derived artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Write an artifact, replacing any previous one with the same name.
    async fn put(&self, name: &str, bytes: &[u8]) -> io::Result<PathBuf>;

    /// Open an artifact for streaming.
    async fn open(&self, name: &str) -> io::Result<fs::File>;

    /// Remove an artifact. Fails if it is already gone.
    async fn remove(&self, name: &str) -> io::Result<()>;

    async fn exists(&self, name: &str) -> bool;

    /// Remove artifacts whose modification time is older than `age`,
    /// returning how many were removed.
    async fn sweep_older_than(&self, age: Duration) -> io::Result<usize>;

    fn path_for(&self, name: &str) -> PathBuf;
}

pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn put(&self, name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.root).await?;

        // Write to a temp sibling, then rename: a concurrent reader never
        // observes a half-written artifact.
        let path = self.path_for(name);
        let staging = self.root.join(format!(".tmp-{}", Uuid::new_v4()));
        fs::write(&staging, bytes).await?;
        fs::rename(&staging, &path).await?;

        Ok(path)
    }

    async fn open(&self, name: &str) -> io::Result<fs::File> {
        fs::File::open(self.path_for(name)).await
    }

    async fn remove(&self, name: &str) -> io::Result<()> {
        fs::remove_file(self.path_for(name)).await
    }

    async fn exists(&self, name: &str) -> bool {
        fs::try_exists(self.path_for(name)).await.unwrap_or(false)
    }

    async fn sweep_older_than(&self, age: Duration) -> io::Result<usize> {
        let mut removed = 0;
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            // nothing stored yet
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        while let Some(entry) = entries.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };
            let stale = metadata
                .modified()
                .ok()
                .and_then(|m| m.elapsed().ok())
                .is_some_and(|elapsed| elapsed > age);
            if stale && fs::remove_file(entry.path()).await.is_ok() {
                removed += 1;
            }
        }

        Ok(removed)
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}
