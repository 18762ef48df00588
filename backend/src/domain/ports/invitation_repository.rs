//! Port for the invitation ledger's storage.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{InvitationDigest, NewInvitation, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by invitation repository adapters.
    pub enum InvitationPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "invitation repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "invitation repository query failed: {message}",
        /// The invitation referenced a user that does not exist.
        UnknownUser => "invitation references an unknown user",
    }
}

/// Outcome of an atomic digest lookup-and-delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvitationLookup {
    /// A live entry matched; it has been deleted and its user activated.
    Consumed(User),
    /// An entry matched but had expired; it has been deleted.
    Expired,
    /// Nothing matched.
    Missing,
}

/// Storage for invitation digests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InvitationRepository: Send + Sync {
    /// Store an entry for `user`, replacing any existing one.
    async fn create(
        &self,
        user: UserId,
        invitation: &NewInvitation,
    ) -> Result<(), InvitationPersistenceError>;

    /// Find and delete the entry for `digest`, classifying it against `now`.
    ///
    /// A live entry's user is marked active in the same atomic unit, so a
    /// failure either leaves the entry in place or leaves the user active.
    async fn redeem(
        &self,
        digest: &InvitationDigest,
        now: DateTime<Utc>,
    ) -> Result<InvitationLookup, InvitationPersistenceError>;
}
