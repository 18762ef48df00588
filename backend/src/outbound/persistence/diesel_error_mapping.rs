//! Classification of Diesel and pool failures shared by every repository.
//!
//! Adapters first reduce a failure to a [`StoreFailure`], then convert it into
//! their port's error enum. Constraint names come from the migrations under
//! `backend/migrations`.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::{debug, warn};

use crate::domain::ports::{
    FeedPersistenceError, FollowPersistenceError, InvitationPersistenceError,
    PostPersistenceError, UserPersistenceError,
};

use super::pool::PoolError;

pub(crate) const USERNAME_UNIQUE: &str = "users_username_key";
pub(crate) const EMAIL_UNIQUE: &str = "users_email_key";
pub(crate) const FOLLOW_PKEY: &str = "followers_pkey";
pub(crate) const COMMENT_POST_FKEY: &str = "comments_post_id_fkey";
pub(crate) const LIKE_POST_FKEY: &str = "post_likes_post_id_fkey";

/// Backend-neutral shape of a store failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StoreFailure {
    /// The pool or the connection failed.
    Connection(String),
    /// A unique or primary key constraint rejected a write.
    Unique { constraint: Option<String> },
    /// A foreign key constraint rejected a write.
    ForeignKey { constraint: Option<String> },
    /// Any other failure, including rows that fail domain validation.
    Query(String),
}

impl StoreFailure {
    fn constraint_is(constraint: Option<&String>, name: &str) -> bool {
        constraint.is_some_and(|c| c == name)
    }
}

impl From<PoolError> for StoreFailure {
    fn from(error: PoolError) -> Self {
        match error {
            PoolError::Checkout { message } | PoolError::Build { message } => {
                Self::Connection(message)
            }
        }
    }
}

impl From<DieselError> for StoreFailure {
    fn from(error: DieselError) -> Self {
        match &error {
            DieselError::DatabaseError(kind, info) => {
                debug!(
                    ?kind,
                    message = info.message(),
                    constraint = info.constraint_name(),
                    "diesel operation failed"
                );
            }
            _ => debug!(error = %error, "diesel operation failed"),
        }

        match error {
            DieselError::DatabaseError(kind, info) => {
                let constraint = info.constraint_name().map(str::to_owned);
                match kind {
                    DatabaseErrorKind::UniqueViolation => Self::Unique { constraint },
                    DatabaseErrorKind::ForeignKeyViolation => Self::ForeignKey { constraint },
                    DatabaseErrorKind::ClosedConnection => {
                        Self::Connection("database connection error".to_owned())
                    }
                    _ => Self::Query("database error".to_owned()),
                }
            }
            DieselError::NotFound => Self::Query("record not found".to_owned()),
            DieselError::QueryBuilderError(_) => Self::Query("database query error".to_owned()),
            DieselError::BrokenTransactionManager => {
                Self::Connection("transaction manager is broken".to_owned())
            }
            _ => Self::Query("database error".to_owned()),
        }
    }
}

impl From<StoreFailure> for UserPersistenceError {
    fn from(failure: StoreFailure) -> Self {
        match failure {
            StoreFailure::Connection(message) => Self::connection(message),
            StoreFailure::Unique { constraint }
                if StoreFailure::constraint_is(constraint.as_ref(), USERNAME_UNIQUE) =>
            {
                Self::duplicate_username()
            }
            StoreFailure::Unique { constraint }
                if StoreFailure::constraint_is(constraint.as_ref(), EMAIL_UNIQUE) =>
            {
                Self::duplicate_email()
            }
            StoreFailure::Unique { constraint } | StoreFailure::ForeignKey { constraint } => {
                warn!(?constraint, "unexpected constraint violation on users");
                Self::query("constraint violation")
            }
            StoreFailure::Query(message) => Self::query(message),
        }
    }
}

impl From<StoreFailure> for InvitationPersistenceError {
    fn from(failure: StoreFailure) -> Self {
        match failure {
            StoreFailure::Connection(message) => Self::connection(message),
            StoreFailure::ForeignKey { .. } => Self::unknown_user(),
            StoreFailure::Unique { constraint } => {
                warn!(?constraint, "unexpected unique violation on invitations");
                Self::query("constraint violation")
            }
            StoreFailure::Query(message) => Self::query(message),
        }
    }
}

impl From<StoreFailure> for FollowPersistenceError {
    fn from(failure: StoreFailure) -> Self {
        match failure {
            StoreFailure::Connection(message) => Self::connection(message),
            StoreFailure::Unique { constraint }
                if StoreFailure::constraint_is(constraint.as_ref(), FOLLOW_PKEY) =>
            {
                Self::duplicate_edge()
            }
            StoreFailure::Unique { constraint } => {
                warn!(?constraint, "unexpected unique violation on followers");
                Self::query("constraint violation")
            }
            StoreFailure::ForeignKey { .. } => Self::unknown_user(),
            StoreFailure::Query(message) => Self::query(message),
        }
    }
}

impl From<StoreFailure> for PostPersistenceError {
    fn from(failure: StoreFailure) -> Self {
        match failure {
            StoreFailure::Connection(message) => Self::connection(message),
            StoreFailure::ForeignKey { constraint }
                if StoreFailure::constraint_is(constraint.as_ref(), COMMENT_POST_FKEY)
                    || StoreFailure::constraint_is(constraint.as_ref(), LIKE_POST_FKEY) =>
            {
                Self::missing_post()
            }
            StoreFailure::Unique { constraint } | StoreFailure::ForeignKey { constraint } => {
                warn!(?constraint, "unexpected constraint violation on posts");
                Self::query("constraint violation")
            }
            StoreFailure::Query(message) => Self::query(message),
        }
    }
}

impl From<StoreFailure> for FeedPersistenceError {
    fn from(failure: StoreFailure) -> Self {
        match failure {
            StoreFailure::Connection(message) => Self::connection(message),
            StoreFailure::Unique { .. } | StoreFailure::ForeignKey { .. } => {
                Self::query("constraint violation")
            }
            StoreFailure::Query(message) => Self::query(message),
        }
    }
}

/// Convert a Diesel or pool failure into the caller's port error.
pub(crate) fn map_store_error<E, F>(error: F) -> E
where
    F: Into<StoreFailure>,
    E: From<StoreFailure>,
{
    E::from(error.into())
}

/// Convert rows, reporting the first one that fails domain validation.
pub(crate) fn convert_rows<R, T, E>(rows: Vec<R>) -> Result<Vec<T>, E>
where
    T: TryFrom<R, Error = String>,
    E: From<StoreFailure>,
{
    rows.into_iter()
        .map(T::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|message| E::from(StoreFailure::Query(message)))
}

/// Convert one row, reporting a domain validation failure as a query error.
pub(crate) fn convert_row<R, T, E>(row: R) -> Result<T, E>
where
    T: TryFrom<R, Error = String>,
    E: From<StoreFailure>,
{
    T::try_from(row).map_err(|message| E::from(StoreFailure::Query(message)))
}
