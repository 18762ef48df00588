//! Offset pagination primitives shared by list endpoints.
//!
//! A [`PageRequest`] carries a validated `limit`/`offset` pair. Wrapping a
//! page of results with [`Paginated::new`] produces the JSON envelope handed
//! to clients: the items, the request window and navigation links derived
//! from the request URL. Links keep every other query parameter intact so
//! filters survive navigation.
//!
//! ```
//! use pagination::{PageRequest, Paginated};
//! use url::Url;
//!
//! let base = Url::parse("https://api.test/feed?sort=asc&limit=2").expect("url");
//! let page = Paginated::new(vec!["a", "b"], PageRequest::new(2, 0).expect("window"), &base);
//! assert_eq!(
//!     page.links.next.as_deref(),
//!     Some("https://api.test/feed?sort=asc&limit=2&offset=2")
//! );
//! assert!(page.links.prev.is_none());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

const LIMIT_PARAM: &str = "limit";
const OFFSET_PARAM: &str = "offset";

/// Errors raised when constructing a [`PageRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageRequestError {
    /// Pages must hold at least one item.
    #[error("page limit must be at least 1")]
    ZeroLimit,
}

/// A validated page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    limit: u32,
    offset: u64,
}

impl PageRequest {
    /// Build a window of `limit` items starting at `offset`.
    ///
    /// # Errors
    ///
    /// [`PageRequestError::ZeroLimit`] when `limit` is zero.
    pub const fn new(limit: u32, offset: u64) -> Result<Self, PageRequestError> {
        if limit == 0 {
            return Err(PageRequestError::ZeroLimit);
        }
        Ok(Self { limit, offset })
    }

    /// Maximum number of items in the page.
    #[must_use]
    pub const fn limit(self) -> u32 {
        self.limit
    }

    /// Number of items skipped before the page.
    #[must_use]
    pub const fn offset(self) -> u64 {
        self.offset
    }

    /// Window immediately after this one.
    #[must_use]
    pub fn next(self) -> Self {
        Self {
            limit: self.limit,
            offset: self.offset.saturating_add(u64::from(self.limit)),
        }
    }

    /// Window immediately before this one, or `None` on the first page.
    #[must_use]
    pub fn prev(self) -> Option<Self> {
        (self.offset > 0).then(|| Self {
            limit: self.limit,
            offset: self.offset.saturating_sub(u64::from(self.limit)),
        })
    }
}

/// Navigation links for a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationLinks {
    /// The current page.
    #[serde(rename = "self")]
    pub self_: String,
    /// The following page, present when the current one is full.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    /// The preceding page, present unless this is the first page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
}

/// Page of items plus the window and links that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Items on this page.
    pub data: Vec<T>,
    /// Requested page size.
    pub limit: u32,
    /// Items skipped before this page.
    pub offset: u64,
    /// Navigation links.
    pub links: PaginationLinks,
}

impl<T> Paginated<T> {
    /// Wrap `data` fetched for `request`, deriving links from `base`.
    ///
    /// A `next` link is emitted only when the page is full, so an exactly
    /// full final page still advertises one more (empty) page.
    #[must_use]
    pub fn new(data: Vec<T>, request: PageRequest, base: &Url) -> Self {
        let full = data.len() >= usize::try_from(request.limit()).unwrap_or(usize::MAX);
        let links = PaginationLinks {
            self_: String::from(window_url(base, request)),
            next: full.then(|| String::from(window_url(base, request.next()))),
            prev: request
                .prev()
                .map(|window| String::from(window_url(base, window))),
        };
        Self {
            data,
            limit: request.limit(),
            offset: request.offset(),
            links,
        }
    }

    /// Convert every item, keeping the window and links.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            limit: self.limit,
            offset: self.offset,
            links: self.links,
        }
    }
}

/// `base` with its `limit` and `offset` parameters replaced by `window`.
fn window_url(base: &Url, window: PageRequest) -> Url {
    let retained: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| key != LIMIT_PARAM && key != OFFSET_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    let mut url = base.clone();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained.iter())
        .append_pair(LIMIT_PARAM, &window.limit().to_string())
        .append_pair(OFFSET_PARAM, &window.offset().to_string());
    url
}
