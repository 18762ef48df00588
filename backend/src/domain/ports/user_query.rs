//! Driving port for public profile lookups.

use async_trait::async_trait;

use crate::domain::{Error, User, UserId};

/// Domain use-case port for reading user profiles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserQuery: Send + Sync {
    /// Fetch the user with `id`.
    async fn fetch_user(&self, id: UserId) -> Result<User, Error>;
}
