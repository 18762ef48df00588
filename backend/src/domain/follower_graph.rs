//! Follower graph: directed follow edges between users.
//!
//! Conflicts are detected by the store (primary key on the ordered pair,
//! foreign keys on both endpoints), so two concurrent follows of the same
//! pair produce exactly one edge and one `AlreadyFollowing`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::ports::{FollowCommand, FollowPersistenceError, FollowRepository};
use super::{Deadline, DeadlineExceeded, Error, UserId};

/// Ordered `(follower, followed)` pair. Never a self-loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FollowEdge {
    follower: UserId,
    followed: UserId,
}

impl FollowEdge {
    /// Build an edge, rejecting self-follows.
    ///
    /// # Examples
    /// ```
    /// use social_backend::domain::{FollowEdge, FollowError, UserId};
    ///
    /// assert!(FollowEdge::new(UserId::new(1), UserId::new(2)).is_ok());
    /// assert_eq!(
    ///     FollowEdge::new(UserId::new(1), UserId::new(1)),
    ///     Err(FollowError::SelfFollow)
    /// );
    /// ```
    pub fn new(follower: UserId, followed: UserId) -> Result<Self, FollowError> {
        if follower == followed {
            return Err(FollowError::SelfFollow);
        }
        Ok(Self { follower, followed })
    }

    /// User doing the following.
    pub fn follower(&self) -> UserId {
        self.follower
    }

    /// User being followed.
    pub fn followed(&self) -> UserId {
        self.followed
    }
}

/// Follow graph failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FollowError {
    /// Follower and followed are the same user.
    #[error("users cannot follow themselves")]
    SelfFollow,
    /// The edge already exists.
    #[error("already following this user")]
    AlreadyFollowing,
    /// The followed user does not exist.
    #[error("user not found")]
    UnknownUser,
    /// The record store failed.
    #[error(transparent)]
    Store(FollowPersistenceError),
}

impl From<FollowPersistenceError> for FollowError {
    fn from(value: FollowPersistenceError) -> Self {
        match value {
            FollowPersistenceError::DuplicateEdge => Self::AlreadyFollowing,
            FollowPersistenceError::UnknownUser => Self::UnknownUser,
            other => Self::Store(other),
        }
    }
}

impl From<DeadlineExceeded> for FollowPersistenceError {
    fn from(value: DeadlineExceeded) -> Self {
        Self::connection(value.to_string())
    }
}

impl From<FollowError> for Error {
    fn from(value: FollowError) -> Self {
        match value {
            FollowError::SelfFollow => {
                Error::invalid_field("id", "self_follow", value.to_string())
            }
            FollowError::AlreadyFollowing => {
                Error::conflict(value.to_string()).with_code("already_following")
            }
            FollowError::UnknownUser => Error::not_found(value.to_string()),
            FollowError::Store(FollowPersistenceError::Connection { message }) => {
                Error::service_unavailable(format!("follow repository unavailable: {message}"))
            }
            FollowError::Store(err) => Error::internal(format!("follow repository error: {err}")),
        }
    }
}

/// Mutates the follow relation on behalf of an authenticated caller.
#[derive(Clone)]
pub struct FollowerGraph<F> {
    repo: Arc<F>,
    deadline: Deadline,
}

impl<F> FollowerGraph<F> {
    /// Build the graph service over `repo`.
    pub fn new(repo: Arc<F>) -> Self {
        Self {
            repo,
            deadline: Deadline::default(),
        }
    }

    /// Override the store deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }
}

impl<F> FollowerGraph<F>
where
    F: FollowRepository,
{
    /// Create the edge `follower -> followed`.
    pub async fn follow(&self, follower: UserId, followed: UserId) -> Result<(), FollowError> {
        let edge = FollowEdge::new(follower, followed)?;
        self.deadline
            .bound("follow.insert", self.repo.insert(edge))
            .await?;
        debug!(%follower, %followed, "follow edge created");
        Ok(())
    }

    /// Remove the edge `follower -> followed`. Removing an absent edge
    /// succeeds.
    pub async fn unfollow(&self, follower: UserId, followed: UserId) -> Result<(), FollowError> {
        let edge = FollowEdge::new(follower, followed)?;
        let removed = self
            .deadline
            .bound("follow.remove", self.repo.remove(edge))
            .await?;
        debug!(%follower, %followed, removed, "follow edge removed");
        Ok(())
    }
}

#[async_trait]
impl<F> FollowCommand for FollowerGraph<F>
where
    F: FollowRepository,
{
    async fn follow(&self, follower: UserId, followed: UserId) -> Result<(), Error> {
        FollowerGraph::follow(self, follower, followed)
            .await
            .map_err(Error::from)
    }

    async fn unfollow(&self, follower: UserId, followed: UserId) -> Result<(), Error> {
        FollowerGraph::unfollow(self, follower, followed)
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::MockFollowRepository;
    use rstest::rstest;

    fn graph(repo: MockFollowRepository) -> FollowerGraph<MockFollowRepository> {
        FollowerGraph::new(Arc::new(repo))
    }

    #[rstest]
    #[tokio::test]
    async fn self_follow_is_rejected_without_touching_the_store() {
        let mut repo = MockFollowRepository::new();
        repo.expect_insert().never();

        let err = graph(repo)
            .follow(UserId::new(4), UserId::new(4))
            .await
            .expect_err("self follow");
        assert_eq!(err, FollowError::SelfFollow);
        assert_eq!(Error::from(err).code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn follow_inserts_the_ordered_edge() {
        let mut repo = MockFollowRepository::new();
        repo.expect_insert()
            .withf(|edge| edge.follower() == UserId::new(1) && edge.followed() == UserId::new(2))
            .times(1)
            .return_once(|_| Ok(()));

        graph(repo)
            .follow(UserId::new(1), UserId::new(2))
            .await
            .expect("follow succeeds");
    }

    #[rstest]
    #[case(
        FollowPersistenceError::duplicate_edge(),
        FollowError::AlreadyFollowing,
        ErrorCode::Conflict
    )]
    #[case(FollowPersistenceError::unknown_user(), FollowError::UnknownUser, ErrorCode::NotFound)]
    #[case(
        FollowPersistenceError::connection("down"),
        FollowError::Store(FollowPersistenceError::connection("down")),
        ErrorCode::ServiceUnavailable
    )]
    #[case(
        FollowPersistenceError::query("bad sql"),
        FollowError::Store(FollowPersistenceError::query("bad sql")),
        ErrorCode::InternalError
    )]
    #[tokio::test]
    async fn store_failures_are_classified(
        #[case] store_error: FollowPersistenceError,
        #[case] expected: FollowError,
        #[case] code: ErrorCode,
    ) {
        let mut repo = MockFollowRepository::new();
        repo.expect_insert()
            .times(1)
            .return_once(move |_| Err(store_error));

        let err = graph(repo)
            .follow(UserId::new(1), UserId::new(2))
            .await
            .expect_err("store failure");
        assert_eq!(err, expected);
        assert_eq!(Error::from(err).code(), code);
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    #[tokio::test]
    async fn unfollow_is_idempotent(#[case] existed: bool) {
        let mut repo = MockFollowRepository::new();
        repo.expect_remove()
            .times(1)
            .return_once(move |_| Ok(existed));

        graph(repo)
            .unfollow(UserId::new(1), UserId::new(2))
            .await
            .expect("unfollow always succeeds");
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_follow_maps_to_already_following_code() {
        let mut repo = MockFollowRepository::new();
        repo.expect_insert()
            .return_once(|_| Err(FollowPersistenceError::duplicate_edge()));

        let err = FollowCommand::follow(&graph(repo), UserId::new(1), UserId::new(2))
            .await
            .expect_err("duplicate");
        assert_eq!(err.code(), ErrorCode::Conflict);
        assert_eq!(
            err.details().and_then(|d| d["code"].as_str()),
            Some("already_following")
        );
    }
}
