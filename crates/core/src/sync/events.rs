//! Event cache, deduplication, and event writing

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};
use trailsync_domain::constants::DEDUP_TOLERANCE_SECS;
use trailsync_domain::{CalendarRef, EventDraft, ExistingEvent, Result, TrackRecord};

use crate::calendar_ports::CalendarStore;
use crate::pagination::drain_pages;

/// Find the calendar with the given summary, creating it when absent
pub async fn resolve_calendar(calendar: &dyn CalendarStore, name: &str) -> Result<CalendarRef> {
    let calendars = drain_pages(|token| calendar.list_calendars(token)).await?;

    if let Some(found) = calendars.into_iter().find(|c| c.summary == name) {
        debug!(calendar = %found.summary, id = %found.id, "resolved calendar");
        return Ok(found);
    }

    info!(calendar = name, "no calendar with that name found, creating one");
    calendar.create_calendar(name).await
}

/// All events of the target calendar, loaded once per run
///
/// The snapshot is read-only after load and is never refreshed mid-run, so
/// a run does not see the events it creates itself.
pub struct EventCache {
    events: Vec<ExistingEvent>,
}

impl EventCache {
    /// Load every event of the calendar, following pagination
    pub async fn load(calendar: &dyn CalendarStore, calendar_id: &str) -> Result<Self> {
        let events = drain_pages(|token| calendar.list_events(calendar_id, token)).await?;
        debug!(count = events.len(), "loaded existing calendar events");

        Ok(Self { events })
    }

    /// Build a cache from an in-memory snapshot
    pub fn from_events(events: Vec<ExistingEvent>) -> Self {
        Self { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Whether the record already has a corresponding event
    pub fn contains_match(&self, record: &TrackRecord) -> bool {
        self.events.iter().any(|event| matches_record(event, record))
    }
}

/// Titles must be equal and both endpoints must sit inside the fuzz window
fn matches_record(existing: &ExistingEvent, record: &TrackRecord) -> bool {
    existing.title == record.title
        && within_tolerance(existing.start, record.start)
        && within_tolerance(existing.end, record.end)
}

/// The delta is signed: an existing timestamp up to the tolerance *before*
/// the record's matches, one after it never does.
fn within_tolerance(existing: DateTime<Utc>, candidate: DateTime<Utc>) -> bool {
    let delta = candidate - existing;
    delta >= Duration::zero() && delta <= Duration::seconds(DEDUP_TOLERANCE_SECS)
}

/// Build the event payload for one track record
pub fn build_event_draft(record: &TrackRecord) -> EventDraft {
    EventDraft {
        summary: record.title.clone(),
        location: record.location.clone(),
        description: record.description.clone(),
        start: record.start,
        end: record.end,
    }
}

/// Submit one create-event call for the record. No retry; errors propagate.
pub async fn write_event(
    calendar: &dyn CalendarStore,
    calendar_id: &str,
    record: &TrackRecord,
) -> Result<()> {
    debug!(event = %record.title, "adding event to calendar");
    calendar.insert_event(calendar_id, &build_event_draft(record)).await
}
