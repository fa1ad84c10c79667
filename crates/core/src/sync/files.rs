//! Track file enumeration
//!
//! Produces the `(title, payload)` pairs for one run: the folder's track
//! files are listed up front (paginated), then each payload is fetched on
//! demand. The feed is finite and non-restartable — it is built per run
//! and consumed once.

use tracing::{debug, warn};
use trailsync_domain::{RemoteFileRef, Result};

use crate::pagination::drain_pages;
use crate::storage_ports::FileStore;

/// One downloaded track file
#[derive(Debug, Clone)]
pub struct TrackFile {
    pub title: String,
    pub data: Vec<u8>,
}

/// Lazy feed of track files inside one folder
pub struct TrackFileFeed<'a> {
    store: &'a dyn FileStore,
    pending: std::vec::IntoIter<RemoteFileRef>,
}

impl<'a> TrackFileFeed<'a> {
    /// List the folder's track files and prepare the feed
    pub async fn open(store: &'a dyn FileStore, folder_id: &str) -> Result<Self> {
        let refs = drain_pages(|token| store.list_track_files(folder_id, token)).await?;
        debug!(count = refs.len(), "listed track files in folder");

        Ok(Self { store, pending: refs.into_iter() })
    }

    /// Next successfully downloaded file, or `None` when the feed is
    /// exhausted.
    ///
    /// A file whose download comes back with a non-success status is
    /// logged and skipped; the feed moves on to the next file. Transport
    /// and metadata errors propagate.
    pub async fn next(&mut self) -> Result<Option<TrackFile>> {
        while let Some(file_ref) = self.pending.next() {
            let meta = self.store.file_metadata(&file_ref.id).await?;
            let title = strip_extension(&meta.title);

            debug!(file = %meta.title, "downloading track payload");
            let download = self.store.download(&meta.download_url).await?;

            if !(200..300).contains(&download.status) {
                warn!(
                    file = %meta.title,
                    status = download.status,
                    "error occurred downloading track file; skipping"
                );
                continue;
            }

            return Ok(Some(TrackFile { title, data: download.body }));
        }

        Ok(None)
    }
}

/// Display title: the filename minus its last extension
fn strip_extension(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => filename.to_string(),
    }
}
