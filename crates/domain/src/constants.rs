//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// File storage media types
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
pub const TRACK_FILE_MIME_TYPE: &str = "application/vnd.google-earth.kml+xml";

// Timestamp formats: track files carry six fractional digits, the calendar
// service takes whole seconds
pub const TRACK_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";
pub const EVENT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

// Deduplication window
pub const DEDUP_TOLERANCE_SECS: i64 = 2;

// Map links appended to event descriptions
pub const MAP_LINK_BASE: &str = "https://maps.google.com/?q=";

// Sync defaults
pub const DEFAULT_FOLDER_NAME: &str = "My Tracks";
pub const DEFAULT_CALENDAR_NAME: &str = "Logging";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
