//! Page-token pagination helper
//!
//! Listing endpoints on the external services return results in batches
//! linked by an opaque continuation token. [`drain_pages`] collects every
//! batch into one ordered sequence.

use std::future::Future;

use trailsync_domain::Result;

/// One page of a token-linked listing
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

/// Drain a page-token listing into one ordered sequence.
///
/// `fetch_page` is called with `None` first, then with each continuation
/// token the service hands back. The termination condition is checked
/// before each fetch: enumeration ends only once a page carries no token.
/// A page with a token but no items keeps going — the token, not the item
/// count, signals exhaustion. No fixed page size is assumed, and a failed
/// page fetch propagates unmodified.
pub async fn drain_pages<T, F, Fut>(mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut items = Vec::new();
    let mut token: Option<String> = None;
    let mut first_page = true;

    while first_page || token.is_some() {
        first_page = false;
        let page = fetch_page(token.take()).await?;
        items.extend(page.items);
        token = page.next_page_token;
    }

    Ok(items)
}
