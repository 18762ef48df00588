//! Driving port for the activity feed.

use async_trait::async_trait;

use crate::domain::{Error, FeedEntry, FeedQuery, RawFeedParams, UserId};

/// One window of the feed together with the validated query that produced
/// it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPage {
    /// Entries in the requested order.
    pub entries: Vec<FeedEntry>,
    /// Normalised query, used to build pagination links.
    pub query: FeedQuery,
}

/// Domain use-case port for reading a user's feed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedQueryService: Send + Sync {
    /// Validate `params` and return the matching window of `viewer`'s feed.
    async fn feed(&self, viewer: UserId, params: &RawFeedParams) -> Result<FeedPage, Error>;
}
