//! # TrailSync Core
//!
//! The synchronization engine behind TrailSync.
//!
//! This crate contains:
//! - Port traits for file storage and the calendar service
//! - The page-token pagination helper
//! - The KML track parser
//! - The sync runner (folder resolution, file feed, event cache, dedup,
//!   event writing)
//!
//! ## Architecture
//! - Implements no I/O itself; adapters in `trailsync-infra` implement the
//!   port traits
//! - Depends only on `trailsync-domain`

pub mod calendar_ports;
pub mod kml;
pub mod pagination;
pub mod storage_ports;
pub mod sync;

// Re-export commonly used items
pub use calendar_ports::CalendarStore;
pub use kml::parse_track;
pub use pagination::{drain_pages, Page};
pub use storage_ports::FileStore;
pub use sync::{EventCache, SyncRunner};
