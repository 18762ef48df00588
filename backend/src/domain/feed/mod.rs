//! Feed query engine.
//!
//! Raw request parameters are parsed into a [`FeedQuery`] before any store
//! access; the store then returns posts authored by the viewer or anyone the
//! viewer follows, joined with author and engagement counts.

mod query;
mod service;

pub use query::{
    DEFAULT_FEED_LIMIT, DEFAULT_FEED_MAX_LIMIT, FEED_TAGS_MAX, FeedQuery, FeedValidationError,
    RawFeedParams, SEARCH_MAX, SortDirection,
};
pub use service::{FeedEngine, FeedError};

use super::{Post, Username};

/// Read-only projection of a post for presentation in a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    /// The post; `post.author_id` identifies the author.
    pub post: Post,
    /// Author's username at query time.
    pub author_username: Username,
    /// Number of comments on the post.
    pub comment_count: u64,
    /// Number of likes on the post.
    pub like_count: u64,
}

#[cfg(test)]
mod tests;
