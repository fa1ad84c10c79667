//! File storage port interfaces
//!
//! Implemented by the infra Drive adapter; the sync engine only sees this
//! surface.

use async_trait::async_trait;
use trailsync_domain::{FileDownload, RemoteFileMetadata, RemoteFileRef, RemoteFolder, Result};

use crate::pagination::Page;

/// Trait for file-storage listing and download operations
#[async_trait]
pub trait FileStore: Send + Sync {
    /// List folders whose title matches `name` exactly (case-sensitive),
    /// one page at a time
    async fn list_folders(
        &self,
        name: &str,
        page_token: Option<String>,
    ) -> Result<Page<RemoteFolder>>;

    /// List non-trashed track files inside a folder, one page at a time
    async fn list_track_files(
        &self,
        folder_id: &str,
        page_token: Option<String>,
    ) -> Result<Page<RemoteFileRef>>;

    /// Fetch full metadata for one file
    async fn file_metadata(&self, file_id: &str) -> Result<RemoteFileMetadata>;

    /// Download a payload. Non-success statuses are reported in the result
    /// value, not as errors — the caller decides whether to skip the file.
    async fn download(&self, download_url: &str) -> Result<FileDownload>;
}
