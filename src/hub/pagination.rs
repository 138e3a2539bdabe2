//! Offset/limit pagination over `{totalCount, items}` listings.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{HubTransport, Page};
use crate::constants::MAX_PAGE_SIZE;
use crate::core::HubError;

/// Fetches every page of a listing endpoint.
///
/// Pages are requested sequentially at offsets `0, P, 2P, ...` with
/// `limit = P` until the declared `totalCount` is reached, so a listing of
/// `N > 0` items costs `ceil(N / P)` requests. Item order is exactly the
/// server's.
///
/// # Examples
///
/// ```rust,no_run
/// use bdmetrics::hub::{GroupNode, PageCursor, Session};
///
/// # async fn example(session: &Session) -> Result<(), bdmetrics::core::HubError> {
/// let cursor = PageCursor::new(session, 1000);
/// let children: Vec<GroupNode> = cursor
///     .fetch_all("https://hub/api/project-groups/g1/children", &[])
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PageCursor<'a, T> {
    transport: &'a T,
    page_size: usize,
}

impl<'a, T: HubTransport> PageCursor<'a, T> {
    /// Create a cursor; `page_size` is clamped to `1..=1000`.
    pub fn new(transport: &'a T, page_size: usize) -> Self {
        Self {
            transport,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Effective page size.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Fetch the single page starting at `offset`.
    ///
    /// # Errors
    ///
    /// Propagates transport errors and returns [`HubError::Parse`] when the
    /// body is not a `{totalCount, items}` envelope of `I`.
    pub async fn fetch_page<I: DeserializeOwned>(
        &self,
        url: &str,
        offset: usize,
        extra_query: &[(&str, String)],
    ) -> Result<Page<I>, HubError> {
        let mut query = extra_query.to_vec();
        query.push(("offset", offset.to_string()));
        query.push(("limit", self.page_size.to_string()));

        let body = self.transport.get_json(url, &query).await?;
        let mut page: Page<I> = serde_json::from_value(body).map_err(|e| HubError::Parse {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        page.offset = offset;
        page.limit = self.page_size;
        Ok(page)
    }

    /// Fetch and concatenate every page of `url`.
    ///
    /// A failing page aborts the whole listing; nothing partial is returned.
    /// A page that comes back empty before `totalCount` is reached ends the
    /// listing early with a warning.
    ///
    /// # Errors
    ///
    /// The first error of any page request.
    pub async fn fetch_all<I: DeserializeOwned>(
        &self,
        url: &str,
        extra_query: &[(&str, String)],
    ) -> Result<Vec<I>, HubError> {
        let first: Page<I> = self.fetch_page(url, 0, extra_query).await?;
        let total = first.total_count;
        let mut items = first.items;
        let mut offset = 0;

        while items.len() < total {
            offset += self.page_size;
            if offset >= total {
                warn!(
                    "{} declared {} items but pages ended after {}",
                    url,
                    total,
                    items.len()
                );
                break;
            }

            let page: Page<I> = self.fetch_page(url, offset, extra_query).await?;
            if page.items.is_empty() {
                warn!(
                    "{} returned an empty page at offset {} ({} of {} items received)",
                    url,
                    offset,
                    items.len(),
                    total
                );
                break;
            }
            items.extend(page.items);
        }

        debug!("Fetched {} of {} items from {}", items.len(), total, url);
        Ok(items)
    }
}
