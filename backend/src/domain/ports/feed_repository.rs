//! Port for the joined feed read model.
use async_trait::async_trait;

use crate::domain::{FeedEntry, FeedQuery, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by feed repository adapters.
    pub enum FeedPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "feed repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } => "feed repository query failed: {message}",
    }
}

/// Executes validated feed queries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedRepository: Send + Sync {
    /// Posts authored by `viewer` or anyone `viewer` follows, filtered and
    /// ordered per `query`.
    async fn query_feed(
        &self,
        viewer: UserId,
        query: &FeedQuery,
    ) -> Result<Vec<FeedEntry>, FeedPersistenceError>;
}
