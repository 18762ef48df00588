//! Driving port for follow graph mutations.

use async_trait::async_trait;

use crate::domain::{Error, UserId};

/// Domain use-case port for following and unfollowing users.
///
/// `follower` is always the authenticated caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FollowCommand: Send + Sync {
    /// Follow `followed`.
    async fn follow(&self, follower: UserId, followed: UserId) -> Result<(), Error>;

    /// Stop following `followed`. Succeeds when no edge exists.
    async fn unfollow(&self, follower: UserId, followed: UserId) -> Result<(), Error>;
}
