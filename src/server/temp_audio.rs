//! Request-scoped temporary audio files.
//!
//! Every upload gets its own file under the upload directory, named by a fresh
//! UUID so concurrent requests never touch each other's audio. The file lives
//! exactly as long as its [`TempAudioFile`] guard.

use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Extension used when the uploaded filename has no usable one
const DEFAULT_EXTENSION: &str = "webm";

/// Owns one temporary audio file and deletes it on drop.
#[derive(Debug)]
pub struct TempAudioFile {
    path: PathBuf,
}

impl TempAudioFile {
    /// Writes `data` to a new uniquely named file in `dir`.
    ///
    /// If the write fails, whatever was created is removed before returning.
    pub async fn create(dir: &Path, original_name: &str, data: &[u8]) -> io::Result<Self> {
        let file_name = format!("{}.{}", Uuid::new_v4(), extension_for(original_name));
        let guard = Self {
            path: dir.join(file_name),
        };

        tokio::fs::write(&guard.path, data).await?;
        tracing::debug!(path = %guard.path.display(), bytes = data.len(), "Saved upload to temp file");
        Ok(guard)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempAudioFile {
    fn drop(&mut self) {
        // Drop can't await; a single unlink is cheap enough to block on.
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed temp file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove temp file {}: {}", self.path.display(), e),
        }
    }
}

/// Keeps a short alphanumeric extension from the client's filename, else `webm`.
fn extension_for(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}
