//! Calendar port interfaces
//!
//! Implemented by the infra Calendar adapter; the sync engine only sees
//! this surface.

use async_trait::async_trait;
use trailsync_domain::{CalendarRef, EventDraft, ExistingEvent, Result};

use crate::pagination::Page;

/// Trait for calendar listing and event operations
#[async_trait]
pub trait CalendarStore: Send + Sync {
    /// List the calendars visible to the authorized account, one page at a
    /// time
    async fn list_calendars(&self, page_token: Option<String>) -> Result<Page<CalendarRef>>;

    /// Create a calendar with the given summary
    async fn create_calendar(&self, summary: &str) -> Result<CalendarRef>;

    /// List events on a calendar reduced to `(title, start, end)`, one
    /// page at a time
    async fn list_events(
        &self,
        calendar_id: &str,
        page_token: Option<String>,
    ) -> Result<Page<ExistingEvent>>;

    /// Submit one create-event call
    async fn insert_event(&self, calendar_id: &str, draft: &EventDraft) -> Result<()>;
}
