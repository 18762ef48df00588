//! Public profile lookups.

use std::sync::Arc;

use async_trait::async_trait;

use super::ports::{UserPersistenceError, UserQuery, UserRepository};
use super::{Deadline, DeadlineExceeded, Error, User, UserId};

impl From<DeadlineExceeded> for UserPersistenceError {
    fn from(value: DeadlineExceeded) -> Self {
        Self::connection(value.to_string())
    }
}

impl From<UserPersistenceError> for Error {
    fn from(value: UserPersistenceError) -> Self {
        match value {
            UserPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("user repository unavailable: {message}"))
            }
            UserPersistenceError::Query { message } => {
                Error::internal(format!("user repository error: {message}"))
            }
            UserPersistenceError::DuplicateUsername => {
                Error::conflict("username is already taken").with_code("duplicate_username")
            }
            UserPersistenceError::DuplicateEmail => {
                Error::conflict("email is already registered").with_code("duplicate_email")
            }
        }
    }
}

/// Read-only access to user profiles.
#[derive(Clone)]
pub struct UserDirectory<U> {
    users: Arc<U>,
    deadline: Deadline,
}

impl<U> UserDirectory<U> {
    /// Build the directory over `users`.
    pub fn new(users: Arc<U>) -> Self {
        Self {
            users,
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

#[async_trait]
impl<U> UserQuery for UserDirectory<U>
where
    U: UserRepository,
{
    async fn fetch_user(&self, id: UserId) -> Result<User, Error> {
        self.deadline
            .bound("user.find_by_id", self.users.find_by_id(id))
            .await?
            .ok_or_else(|| Error::not_found(format!("user {id} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::MockUserRepository;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn missing_users_are_not_found() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .times(1)
            .return_once(|_| Ok(None));

        let err = UserDirectory::new(Arc::new(repo))
            .fetch_user(UserId::new(3))
            .await
            .expect_err("missing user");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[case(UserPersistenceError::connection("refused"), ErrorCode::ServiceUnavailable)]
    #[case(UserPersistenceError::query("syntax"), ErrorCode::InternalError)]
    #[case(UserPersistenceError::duplicate_email(), ErrorCode::Conflict)]
    #[case(UserPersistenceError::duplicate_username(), ErrorCode::Conflict)]
    fn persistence_errors_map_to_codes(#[case] err: UserPersistenceError, #[case] code: ErrorCode) {
        assert_eq!(Error::from(err).code(), code);
    }
}
