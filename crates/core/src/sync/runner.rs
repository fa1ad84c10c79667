//! Sync runner
//!
//! One idempotent pass: resolve folder → resolve calendar → load the event
//! cache → walk the track files → parse, dedup-check, write. Strictly
//! sequential: every call is awaited in order, nothing runs concurrently.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use trailsync_domain::{Result, SyncSummary};

use crate::calendar_ports::CalendarStore;
use crate::kml::parse_track;
use crate::storage_ports::FileStore;
use crate::sync::events::{resolve_calendar, write_event, EventCache};
use crate::sync::files::TrackFileFeed;
use crate::sync::folder::resolve_track_folder;

/// Orchestrates one synchronization pass over injected ports
pub struct SyncRunner {
    files: Arc<dyn FileStore>,
    calendar: Arc<dyn CalendarStore>,
    folder_name: String,
    calendar_name: String,
}

impl SyncRunner {
    /// Create a new runner
    ///
    /// # Arguments
    /// * `files` - File storage port (already authorized)
    /// * `calendar` - Calendar port (already authorized)
    /// * `folder_name` - Name of the source folder at the storage root
    /// * `calendar_name` - Summary of the target calendar
    pub fn new(
        files: Arc<dyn FileStore>,
        calendar: Arc<dyn CalendarStore>,
        folder_name: String,
        calendar_name: String,
    ) -> Self {
        Self { files, calendar, folder_name, calendar_name }
    }

    /// Perform one synchronization pass and report a summary.
    ///
    /// A folder-resolution failure aborts the run before any file is
    /// processed. Files whose download or parse fails are skipped; the
    /// run continues with the rest.
    #[instrument(skip(self), fields(folder = %self.folder_name, calendar = %self.calendar_name))]
    pub async fn run(&self) -> Result<SyncSummary> {
        info!("starting track synchronization");

        let folder = resolve_track_folder(self.files.as_ref(), &self.folder_name).await?;
        let calendar = resolve_calendar(self.calendar.as_ref(), &self.calendar_name).await?;

        // Loaded once; events written below are invisible to this run.
        let cache = EventCache::load(self.calendar.as_ref(), &calendar.id).await?;

        let mut feed = TrackFileFeed::open(self.files.as_ref(), &folder.id).await?;

        let mut total_parsed = 0usize;
        let mut total_added = 0usize;
        let mut total_failed = 0usize;

        while let Some(file) = feed.next().await? {
            // Malformed payloads are skipped, matching the tolerance
            // granted to failed downloads.
            let record = match parse_track(&file.title, &file.data) {
                Ok(record) => record,
                Err(e) => {
                    warn!(file = %file.title, error = %e, "failed to parse track file; skipping");
                    total_failed += 1;
                    continue;
                }
            };
            total_parsed += 1;

            if cache.contains_match(&record) {
                debug!(event = %record.title, "event already exists");
                continue;
            }

            write_event(self.calendar.as_ref(), &calendar.id, &record).await?;
            total_added += 1;
        }

        let summary = SyncSummary {
            folder: folder.title,
            calendar: calendar.summary,
            total_parsed,
            total_added,
            total_failed,
        };

        info!(
            added = summary.total_added,
            parsed = summary.total_parsed,
            failed = summary.total_failed,
            "track synchronization completed"
        );

        Ok(summary)
    }
}
