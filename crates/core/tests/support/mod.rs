//! In-memory port fakes for sync-engine tests
//!
//! Both fakes page their listings with a small page size so every test
//! exercises the pagination path.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use trailsync_core::pagination::Page;
use trailsync_core::{CalendarStore, FileStore};
use trailsync_domain::{
    CalendarRef, EventDraft, ExistingEvent, FileDownload, ParentRef, RemoteFileMetadata,
    RemoteFileRef, RemoteFolder, Result, TrailSyncError,
};

const PAGE_SIZE: usize = 2;

/// Slice `items` into pages linked by stringified offsets
fn paged<T: Clone>(items: &[T], token: Option<String>) -> Result<Page<T>> {
    let offset = match token {
        Some(t) => t
            .parse::<usize>()
            .map_err(|e| TrailSyncError::Internal(format!("bad page token: {e}")))?,
        None => 0,
    };

    let end = (offset + PAGE_SIZE).min(items.len());
    let next_page_token = if end < items.len() { Some(end.to_string()) } else { None };

    Ok(Page { items: items[offset..end].to_vec(), next_page_token })
}

#[derive(Clone)]
pub struct MockFile {
    pub id: String,
    pub title: String,
    pub status: u16,
    pub body: Vec<u8>,
}

/// In-memory mock for the `FileStore` port
#[derive(Default)]
pub struct MockFileStore {
    folders: Vec<RemoteFolder>,
    files: Vec<MockFile>,
    downloads: Mutex<Vec<String>>,
}

impl MockFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root_folder(mut self, id: &str, title: &str) -> Self {
        self.folders.push(RemoteFolder {
            id: id.to_string(),
            title: title.to_string(),
            parents: vec![ParentRef { id: "root".to_string(), is_root: true }],
        });
        self
    }

    pub fn with_nested_folder(mut self, id: &str, title: &str, parent_id: &str) -> Self {
        self.folders.push(RemoteFolder {
            id: id.to_string(),
            title: title.to_string(),
            parents: vec![ParentRef { id: parent_id.to_string(), is_root: false }],
        });
        self
    }

    pub fn with_file(mut self, id: &str, title: &str, body: &str) -> Self {
        self.files.push(MockFile {
            id: id.to_string(),
            title: title.to_string(),
            status: 200,
            body: body.as_bytes().to_vec(),
        });
        self
    }

    pub fn with_failing_file(mut self, id: &str, title: &str, status: u16) -> Self {
        self.files.push(MockFile {
            id: id.to_string(),
            title: title.to_string(),
            status,
            body: Vec::new(),
        });
        self
    }

    /// Download URLs requested so far
    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }

    fn download_url(id: &str) -> String {
        format!("https://files.example/{id}")
    }
}

#[async_trait]
impl FileStore for MockFileStore {
    async fn list_folders(
        &self,
        name: &str,
        page_token: Option<String>,
    ) -> Result<Page<RemoteFolder>> {
        let matches: Vec<RemoteFolder> =
            self.folders.iter().filter(|f| f.title == name).cloned().collect();
        paged(&matches, page_token)
    }

    async fn list_track_files(
        &self,
        _folder_id: &str,
        page_token: Option<String>,
    ) -> Result<Page<RemoteFileRef>> {
        let refs: Vec<RemoteFileRef> =
            self.files.iter().map(|f| RemoteFileRef { id: f.id.clone() }).collect();
        paged(&refs, page_token)
    }

    async fn file_metadata(&self, file_id: &str) -> Result<RemoteFileMetadata> {
        self.files
            .iter()
            .find(|f| f.id == file_id)
            .map(|f| RemoteFileMetadata {
                id: f.id.clone(),
                title: f.title.clone(),
                download_url: Self::download_url(&f.id),
            })
            .ok_or_else(|| TrailSyncError::NotFound(format!("file {file_id}")))
    }

    async fn download(&self, download_url: &str) -> Result<FileDownload> {
        self.downloads.lock().unwrap().push(download_url.to_string());

        self.files
            .iter()
            .find(|f| Self::download_url(&f.id) == download_url)
            .map(|f| FileDownload { status: f.status, body: f.body.clone() })
            .ok_or_else(|| TrailSyncError::NotFound(format!("download {download_url}")))
    }
}

/// In-memory mock for the `CalendarStore` port
///
/// Inserted events become visible to later `list_events` calls, so a
/// second run sees what the first one wrote.
#[derive(Default)]
pub struct MockCalendarStore {
    calendars: Mutex<Vec<CalendarRef>>,
    events: Mutex<HashMap<String, Vec<ExistingEvent>>>,
    inserted: Mutex<Vec<(String, EventDraft)>>,
    created: Mutex<Vec<String>>,
}

impl MockCalendarStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_calendar(self, id: &str, summary: &str) -> Self {
        self.calendars
            .lock()
            .unwrap()
            .push(CalendarRef { id: id.to_string(), summary: summary.to_string() });
        self
    }

    pub fn with_event(
        self,
        calendar_id: &str,
        title: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        self.events.lock().unwrap().entry(calendar_id.to_string()).or_default().push(
            ExistingEvent { title: title.to_string(), start, end },
        );
        self
    }

    /// Create-event calls recorded so far
    pub fn inserted(&self) -> Vec<(String, EventDraft)> {
        self.inserted.lock().unwrap().clone()
    }

    /// Summaries of calendars created during the test
    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarStore for MockCalendarStore {
    async fn list_calendars(&self, page_token: Option<String>) -> Result<Page<CalendarRef>> {
        let calendars = self.calendars.lock().unwrap().clone();
        paged(&calendars, page_token)
    }

    async fn create_calendar(&self, summary: &str) -> Result<CalendarRef> {
        let mut calendars = self.calendars.lock().unwrap();
        let calendar = CalendarRef {
            id: format!("cal-{}", calendars.len() + 1),
            summary: summary.to_string(),
        };
        calendars.push(calendar.clone());
        self.created.lock().unwrap().push(summary.to_string());
        Ok(calendar)
    }

    async fn list_events(
        &self,
        calendar_id: &str,
        page_token: Option<String>,
    ) -> Result<Page<ExistingEvent>> {
        let events =
            self.events.lock().unwrap().get(calendar_id).cloned().unwrap_or_default();
        paged(&events, page_token)
    }

    async fn insert_event(&self, calendar_id: &str, draft: &EventDraft) -> Result<()> {
        self.inserted.lock().unwrap().push((calendar_id.to_string(), draft.clone()));
        self.events.lock().unwrap().entry(calendar_id.to_string()).or_default().push(
            ExistingEvent { title: draft.summary.clone(), start: draft.start, end: draft.end },
        );
        Ok(())
    }
}
