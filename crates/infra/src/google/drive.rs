//! Google Drive adapter
//!
//! Implements the `FileStore` port over the Drive v2 API. Listing calls
//! return one page per request; the engine's pagination helper drives the
//! continuation tokens.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use trailsync_core::pagination::Page;
use trailsync_core::FileStore;
use trailsync_domain::constants::{FOLDER_MIME_TYPE, TRACK_FILE_MIME_TYPE};
use trailsync_domain::{
    FileDownload, ParentRef, RemoteFileMetadata, RemoteFileRef, RemoteFolder, Result,
    TrailSyncError,
};

use super::auth::AccessTokenProvider;
use super::error_for_status;

const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v2";

/// Drive-backed file store
pub struct GoogleDriveStore {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn AccessTokenProvider>,
}

impl GoogleDriveStore {
    pub fn new(tokens: Arc<dyn AccessTokenProvider>) -> Self {
        Self::with_base_url(tokens, DRIVE_API_BASE)
    }

    /// Adapter pointed at a different endpoint (tests)
    pub fn with_base_url(
        tokens: Arc<dyn AccessTokenProvider>,
        base_url: impl Into<String>,
    ) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into(), tokens }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let access_token = self.tokens.access_token().await?;

        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| TrailSyncError::Network(format!("Drive API request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(error_for_status(response).await);
        }

        response.json().await.map_err(|e| {
            TrailSyncError::InvalidInput(format!("Failed to parse Drive response: {e}"))
        })
    }
}

#[async_trait]
impl FileStore for GoogleDriveStore {
    async fn list_folders(
        &self,
        name: &str,
        page_token: Option<String>,
    ) -> Result<Page<RemoteFolder>> {
        let url = format!("{}/files", self.base_url);
        let query = format!(
            "mimeType='{FOLDER_MIME_TYPE}' and title='{}' and trashed=false",
            escape_query_value(name)
        );

        let mut params = vec![
            ("q", query),
            ("fields", "items(id,title,parents(id,isRoot)),nextPageToken".to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let response: DriveFileList = self.get_json(&url, &params).await?;

        let items = response
            .items
            .into_iter()
            .map(|item| RemoteFolder {
                id: item.id,
                title: item.title.unwrap_or_default(),
                parents: item
                    .parents
                    .into_iter()
                    .map(|p| ParentRef { id: p.id, is_root: p.is_root })
                    .collect(),
            })
            .collect();

        Ok(Page { items, next_page_token: response.next_page_token })
    }

    async fn list_track_files(
        &self,
        folder_id: &str,
        page_token: Option<String>,
    ) -> Result<Page<RemoteFileRef>> {
        let url = format!("{}/files/{}/children", self.base_url, folder_id);
        let query = format!("mimeType='{TRACK_FILE_MIME_TYPE}' and trashed=false");

        let mut params =
            vec![("q", query), ("fields", "items(id),nextPageToken".to_string())];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let response: DriveChildList = self.get_json(&url, &params).await?;

        let items =
            response.items.into_iter().map(|child| RemoteFileRef { id: child.id }).collect();

        Ok(Page { items, next_page_token: response.next_page_token })
    }

    async fn file_metadata(&self, file_id: &str) -> Result<RemoteFileMetadata> {
        let url = format!("{}/files/{}", self.base_url, file_id);
        let item: DriveFile = self.get_json(&url, &[]).await?;

        let download_url = item.download_url.ok_or_else(|| {
            TrailSyncError::InvalidInput(format!("file '{file_id}' has no download URL"))
        })?;

        Ok(RemoteFileMetadata {
            id: item.id,
            title: item.title.unwrap_or_default(),
            download_url,
        })
    }

    async fn download(&self, download_url: &str) -> Result<FileDownload> {
        let access_token = self.tokens.access_token().await?;

        debug!(url = download_url, "downloading file payload");
        let response = self
            .http
            .get(download_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| TrailSyncError::Network(format!("Drive download failed: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TrailSyncError::Network(format!("Drive download failed: {e}")))?
            .to_vec();

        Ok(FileDownload { status, body })
    }
}

/// Single quotes inside a Drive query literal are backslash-escaped
fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    items: Vec<DriveFile>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    title: Option<String>,
    #[serde(default)]
    parents: Vec<DriveParent>,
    #[serde(rename = "downloadUrl")]
    download_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DriveParent {
    id: String,
    #[serde(rename = "isRoot", default)]
    is_root: bool,
}

#[derive(Debug, Deserialize)]
struct DriveChildList {
    #[serde(default)]
    items: Vec<DriveChild>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DriveChild {
    id: String,
}
