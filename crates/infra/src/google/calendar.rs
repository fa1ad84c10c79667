//! Google Calendar adapter
//!
//! Implements the `CalendarStore` port over the Calendar v3 API. Events
//! are reduced to `(title, start, end)` on the way in; all-day entries
//! without a `dateTime` cannot participate in the fuzzy match and are
//! skipped.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use trailsync_core::calendar_ports::CalendarStore;
use trailsync_core::pagination::Page;
use trailsync_domain::constants::EVENT_TIMESTAMP_FORMAT;
use trailsync_domain::{CalendarRef, EventDraft, ExistingEvent, Result, TrailSyncError};

use super::auth::AccessTokenProvider;
use super::error_for_status;

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Calendar-backed event store
pub struct GoogleCalendarStore {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn AccessTokenProvider>,
}

impl GoogleCalendarStore {
    pub fn new(tokens: Arc<dyn AccessTokenProvider>) -> Self {
        Self::with_base_url(tokens, CALENDAR_API_BASE)
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
            .map_err(|e| TrailSyncError::Network(format!("Calendar API request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(error_for_status(response).await);
        }

        response.json().await.map_err(|e| {
            TrailSyncError::InvalidInput(format!("Failed to parse Calendar response: {e}"))
        })
    }

    async fn post_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        let access_token = self.tokens.access_token().await?;

        let response = self
            .http
            .post(url)
            .bearer_auth(access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| TrailSyncError::Network(format!("Calendar API request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(error_for_status(response).await);
        }

        response.json().await.map_err(|e| {
            TrailSyncError::InvalidInput(format!("Failed to parse Calendar response: {e}"))
        })
    }
}

#[async_trait]
impl CalendarStore for GoogleCalendarStore {
    async fn list_calendars(&self, page_token: Option<String>) -> Result<Page<CalendarRef>> {
        let url = format!("{}/users/me/calendarList", self.base_url);

        let mut params =
            vec![("fields", "items(id,summary),nextPageToken".to_string())];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let response: CalendarListResponse = self.get_json(&url, &params).await?;

        let items = response
            .items
            .into_iter()
            .map(|item| CalendarRef { id: item.id, summary: item.summary.unwrap_or_default() })
            .collect();

        Ok(Page { items, next_page_token: response.next_page_token })
    }

    async fn create_calendar(&self, summary: &str) -> Result<CalendarRef> {
        let url = format!("{}/calendars", self.base_url);
        let body = serde_json::json!({ "summary": summary });

        let created: CalendarItem = self.post_json(&url, &body).await?;
        debug!(calendar = %summary, id = %created.id, "created calendar");

        Ok(CalendarRef { id: created.id, summary: created.summary.unwrap_or_default() })
    }

    async fn list_events(
        &self,
        calendar_id: &str,
        page_token: Option<String>,
    ) -> Result<Page<ExistingEvent>> {
        let url = format!("{}/calendars/{}/events", self.base_url, calendar_id);

        let mut params =
            vec![("fields", "items(summary,start,end),nextPageToken".to_string())];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let response: EventsResponse = self.get_json(&url, &params).await?;

        let items = response
            .items
            .into_iter()
            .filter_map(|item| {
                let summary = item.summary?;
                let start = parse_event_time(item.start?)?;
                let end = parse_event_time(item.end?)?;
                Some(ExistingEvent { title: summary, start, end })
            })
            .collect();

        Ok(Page { items, next_page_token: response.next_page_token })
    }

    async fn insert_event(&self, calendar_id: &str, draft: &EventDraft) -> Result<()> {
        let url = format!("{}/calendars/{}/events", self.base_url, calendar_id);

        let body = EventBody {
            summary: &draft.summary,
            location: &draft.location,
            description: &draft.description,
            start: EventTimeBody {
                date_time: draft.start.format(EVENT_TIMESTAMP_FORMAT).to_string(),
            },
            end: EventTimeBody {
                date_time: draft.end.format(EVENT_TIMESTAMP_FORMAT).to_string(),
            },
        };

        let created: InsertedEvent = self.post_json(&url, &body).await?;
        debug!(event = %created.summary.unwrap_or_default(), "event created");

        Ok(())
    }
}

/// `dateTime` events parse to UTC; `date`-only (all-day) entries yield
/// `None` and drop out of the cache
fn parse_event_time(time: EventTimeResponse) -> Option<DateTime<Utc>> {
    let text = time.date_time?;
    match DateTime::parse_from_rfc3339(&text) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(e) => {
            debug!(value = %text, error = %e, "skipping event with unparseable time");
            None
        }
    }
}

#[derive(Debug, Deserialize)]
struct CalendarListResponse {
    #[serde(default)]
    items: Vec<CalendarItem>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CalendarItem {
    id: String,
    summary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    items: Vec<EventItem>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventItem {
    summary: Option<String>,
    start: Option<EventTimeResponse>,
    end: Option<EventTimeResponse>,
}

#[derive(Debug, Deserialize)]
struct EventTimeResponse {
    #[serde(rename = "dateTime")]
    date_time: Option<String>,
}

#[derive(Debug, Serialize)]
struct EventBody<'a> {
    summary: &'a str,
    location: &'a str,
    description: &'a str,
    start: EventTimeBody,
    end: EventTimeBody,
}

#[derive(Debug, Serialize)]
struct EventTimeBody {
    #[serde(rename = "dateTime")]
    date_time: String,
}

#[derive(Debug, Deserialize)]
struct InsertedEvent {
    summary: Option<String>,
}
