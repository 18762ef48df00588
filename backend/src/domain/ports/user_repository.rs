//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{Email, NewInvitation, NewUser, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// The username unique constraint rejected the insert.
        DuplicateUsername => "username is already taken",
        /// The email unique constraint rejected the insert.
        DuplicateEmail => "email is already registered",
    }
}

/// Record-store operations on user accounts.
///
/// Uniqueness of username and email is enforced atomically by the adapter;
/// a losing concurrent insert reports [`UserPersistenceError::DuplicateUsername`]
/// or [`UserPersistenceError::DuplicateEmail`] instead of overwriting.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a pending user together with its invitation entry in one
    /// transaction.
    async fn create_with_invitation(
        &self,
        user: &NewUser,
        invitation: &NewInvitation,
    ) -> Result<User, UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user by normalised email address.
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserPersistenceError>;

    /// Delete a user and everything that cascades from it. Returns whether a
    /// row was removed.
    async fn delete(&self, id: UserId) -> Result<bool, UserPersistenceError>;

}
