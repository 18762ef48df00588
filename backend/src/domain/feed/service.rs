//! Feed engine: validation in front of the feed repository.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{FeedQuery, FeedValidationError, RawFeedParams, DEFAULT_FEED_MAX_LIMIT};
use crate::domain::ports::{FeedPage, FeedPersistenceError, FeedQueryService, FeedRepository};
use crate::domain::{Deadline, DeadlineExceeded, Error, UserId};

/// Feed failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    /// Parameters failed validation; the store was not touched.
    #[error(transparent)]
    Validation(#[from] FeedValidationError),
    /// The record store failed.
    #[error(transparent)]
    Store(#[from] FeedPersistenceError),
}

impl From<DeadlineExceeded> for FeedPersistenceError {
    fn from(value: DeadlineExceeded) -> Self {
        Self::connection(value.to_string())
    }
}

impl From<FeedError> for Error {
    fn from(value: FeedError) -> Self {
        match value {
            FeedError::Validation(err) => {
                Error::invalid_field(err.field(), err.code(), err.to_string())
            }
            FeedError::Store(FeedPersistenceError::Connection { message }) => {
                Error::service_unavailable(format!("feed repository unavailable: {message}"))
            }
            FeedError::Store(FeedPersistenceError::Query { message }) => {
                Error::internal(format!("feed repository error: {message}"))
            }
        }
    }
}

/// Serves validated feed windows.
#[derive(Clone)]
pub struct FeedEngine<F> {
    repo: Arc<F>,
    max_limit: u32,
    deadline: Deadline,
}

impl<F> FeedEngine<F> {
    /// Build the engine with the default page size cap.
    pub fn new(repo: Arc<F>) -> Self {
        Self {
            repo,
            max_limit: DEFAULT_FEED_MAX_LIMIT,
            deadline: Deadline::default(),
        }
    }

    /// Override the page size cap.
    #[must_use]
    pub fn with_max_limit(mut self, max_limit: u32) -> Self {
        self.max_limit = max_limit;
        self
    }

    /// Override the store deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }
}

impl<F> FeedEngine<F>
where
    F: FeedRepository,
{
    /// Validate `params` and fetch the matching window of `viewer`'s feed.
    pub async fn get_feed(
        &self,
        viewer: UserId,
        params: &RawFeedParams,
    ) -> Result<FeedPage, FeedError> {
        let query = FeedQuery::parse(params, self.max_limit)?;
        let entries = self
            .deadline
            .bound("feed.query", self.repo.query_feed(viewer, &query))
            .await?;
        debug!(
            %viewer,
            limit = query.limit(),
            offset = query.offset(),
            sort = %query.sort(),
            returned = entries.len(),
            "feed served"
        );
        Ok(FeedPage { entries, query })
    }
}

#[async_trait]
impl<F> FeedQueryService for FeedEngine<F>
where
    F: FeedRepository,
{
    async fn feed(&self, viewer: UserId, params: &RawFeedParams) -> Result<FeedPage, Error> {
        self.get_feed(viewer, params).await.map_err(Error::from)
    }
}
