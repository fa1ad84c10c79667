//! Common data types used throughout the application

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One GPS-track recording parsed from a geo-annotation file
///
/// Ephemeral: produced per file during a run and consumed by the dedup
/// check and event writer. `location` holds the start coordinate as
/// `"latitude,longitude"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackRecord {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub location: String,
    pub description: String,
}

/// Calendar event reduced to the fields deduplication compares
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExistingEvent {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Event payload submitted to the calendar service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDraft {
    pub summary: String,
    pub location: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A folder in file storage, with its parent references
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteFolder {
    pub id: String,
    pub title: String,
    pub parents: Vec<ParentRef>,
}

/// Parent reference carried by a storage item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentRef {
    pub id: String,
    pub is_root: bool,
}

/// Listing entry for a child file (id only; metadata is a separate fetch)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteFileRef {
    pub id: String,
}

/// Full metadata for one stored file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteFileMetadata {
    pub id: String,
    pub title: String,
    pub download_url: String,
}

/// Raw download result; the status is passed through so the enumerator can
/// decide whether to skip the file
#[derive(Debug, Clone)]
pub struct FileDownload {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Calendar identity as listed by the calendar service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarRef {
    pub id: String,
    pub summary: String,
}

/// Result of one synchronization pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSummary {
    pub folder: String,
    pub calendar: String,
    pub total_parsed: usize,
    pub total_added: usize,
    pub total_failed: usize,
}
