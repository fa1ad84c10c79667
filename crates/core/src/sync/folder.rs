//! Source folder resolution
//!
//! The track folder is addressed by exact name among the folders parented
//! at the storage root. Anything other than exactly one match is a fatal
//! configuration error for the run.

use tracing::debug;
use trailsync_domain::{RemoteFolder, Result, TrailSyncError};

use crate::pagination::drain_pages;
use crate::storage_ports::FileStore;

/// Resolve the single root-level folder with the given name.
///
/// Nested folders that happen to share the name are ignored. Zero or
/// multiple root-level matches abort the run with `Error::Config` before
/// any file is touched.
pub async fn resolve_track_folder(store: &dyn FileStore, name: &str) -> Result<RemoteFolder> {
    let folders = drain_pages(|token| store.list_folders(name, token)).await?;

    // The service-side name filter is not trusted for case; the exact
    // comparison happens here.
    let mut matches: Vec<RemoteFolder> = folders
        .into_iter()
        .filter(|folder| {
            folder.title == name && folder.parents.iter().any(|parent| parent.is_root)
        })
        .collect();

    match matches.len() {
        1 => {
            let folder = matches.remove(0);
            debug!(folder = %folder.title, id = %folder.id, "resolved track folder");
            Ok(folder)
        }
        0 => Err(TrailSyncError::Config(format!(
            "no folder named '{name}' found at the storage root"
        ))),
        n => Err(TrailSyncError::Config(format!(
            "{n} folders named '{name}' found at the storage root; expected exactly one"
        ))),
    }
}
