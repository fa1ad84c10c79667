//! Synchronization engine
//!
//! Folder resolution, track file enumeration, the event cache with its
//! fuzzy dedup check, and the runner that ties one pass together.

pub mod events;
pub mod files;
pub mod folder;
pub mod runner;

pub use events::{build_event_draft, resolve_calendar, write_event, EventCache};
pub use files::{TrackFile, TrackFileFeed};
pub use folder::resolve_track_folder;
pub use runner::SyncRunner;
