//! Local-disk résumé store.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::info;

use crate::error::{BlobError, BlobResult};

/// Prefix of every locator this store hands out.
pub const LOCATOR_PREFIX: &str = "/uploads/";

/// Résumé store over a local uploads directory.
///
/// Stored names are `<upload-millis>-<sanitized-client-name>` so repeated
/// uploads of the same file never collide.
#[derive(Debug, Clone)]
pub struct ResumeStore {
    root: PathBuf,
}

impl ResumeStore {
    /// Create a store rooted at `root`. The directory is created lazily by
    /// [`ResumeStore::init`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Ensure the uploads directory exists.
    pub async fn init(&self) -> BlobResult<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Store résumé bytes under a fresh name and return its locator.
    pub async fn put(&self, client_name: &str, bytes: &[u8]) -> BlobResult<String> {
        let sanitized = sanitize_name(client_name)?;
        let stored = format!("{}-{}", Utc::now().timestamp_millis(), sanitized);

        self.init().await?;
        let path = self.root.join(&stored);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| BlobError::UploadFailed(format!("{}: {e}", path.display())))?;

        info!(name = %stored, size = bytes.len(), "Stored resume");
        Ok(format!("{LOCATOR_PREFIX}{stored}"))
    }

    /// Read back stored bytes by name (the locator without its prefix).
    pub async fn get(&self, name: &str) -> BlobResult<Vec<u8>> {
        validate_stored_name(name)?;
        let path = self.root.join(name);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::not_found(name))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Probe the uploads directory, for the readiness check.
    pub async fn check_connectivity(&self) -> BlobResult<()> {
        self.init().await?;
        tokio::fs::metadata(&self.root).await?;
        Ok(())
    }

    /// Root directory, exposed for tests.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Sanitize a client-supplied filename: collapse whitespace to `-` and
/// reject anything that could escape the uploads directory.
fn sanitize_name(name: &str) -> BlobResult<String> {
    let collapsed: String = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");

    if collapsed.is_empty() {
        return Err(BlobError::invalid_name("empty filename"));
    }
    if collapsed.contains("..") || collapsed.contains('/') || collapsed.contains('\\') {
        return Err(BlobError::invalid_name(name));
    }
    Ok(collapsed)
}

/// Stored names come back from untrusted URLs; re-check them before
/// touching the filesystem.
fn validate_stored_name(name: &str) -> BlobResult<()> {
    if name.is_empty() || name.contains("..") || name.contains('/') || name.contains('\\') {
        return Err(BlobError::invalid_name(name));
    }
    Ok(())
}
