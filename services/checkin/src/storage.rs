//! File-system storage for submitted check-in content
//!
//! One UTF-8 text file per (user, date) under a configurable root directory:
//! `<root>/<username>/<date>/<username>_<date>.txt`. The database row only
//! stores the resulting path.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Placeholder preview shown when a stored file cannot be read back
pub const UNREADABLE_PREVIEW: &str = "[unreadable]";

/// Content store rooted at a configurable upload directory
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    /// Create a content store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the content file for a (user, date) pair
    pub fn path_for(&self, username: &str, date: NaiveDate) -> PathBuf {
        self.root
            .join(username)
            .join(date.to_string())
            .join(format!("{}_{}.txt", username, date))
    }

    /// Write submission content, creating parent directories as needed
    ///
    /// Returns the path of the written file, to be stored on the record row.
    pub async fn write(
        &self,
        username: &str,
        date: NaiveDate,
        content: &str,
    ) -> std::io::Result<PathBuf> {
        let path = self.path_for(username, date);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;
        Ok(path)
    }

    /// Remove a previously written content file
    ///
    /// Used to roll back the file write when the record insert fails.
    pub async fn remove(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::remove_file(path).await
    }

    /// Read the first `n` characters of a stored file
    ///
    /// A file that is missing or unreadable yields a placeholder instead of
    /// an error; admin listings must not fail on one bad file.
    pub async fn preview(&self, path: &Path, n: usize) -> String {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => content.chars().take(n).collect(),
            Err(e) => {
                warn!("Failed to read stored content {}: {}", path.display(), e);
                UNREADABLE_PREVIEW.to_string()
            }
        }
    }
}
