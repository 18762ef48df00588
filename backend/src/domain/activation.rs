//! Account activation through an invitation token.
//!
//! The store deletes the invitation and flips the user's flag in one atomic
//! unit, so a failed activation leaves the token redeemable.

use async_trait::async_trait;
use tracing::debug;

use super::ports::{ActivationCommand, InvitationPersistenceError, InvitationRepository};
use super::{Deadline, Error, InvitationError, InvitationLedger, InvitationToken, User};

impl From<InvitationError> for Error {
    fn from(value: InvitationError) -> Self {
        match value {
            InvitationError::NotFound => {
                Error::not_found("invitation not found").with_code("invitation_not_found")
            }
            InvitationError::Expired => {
                Error::not_found("invitation expired").with_code("invitation_expired")
            }
            InvitationError::Store(InvitationPersistenceError::Connection { message }) => {
                Error::service_unavailable(format!("invitation repository unavailable: {message}"))
            }
            InvitationError::Store(err) => {
                Error::internal(format!("invitation repository error: {err}"))
            }
        }
    }
}

/// Redeems invitations and activates their users.
#[derive(Clone)]
pub struct ActivationService<I> {
    ledger: InvitationLedger<I>,
}

impl<I> ActivationService<I> {
    /// Build the service.
    pub fn new(ledger: InvitationLedger<I>) -> Self {
        Self { ledger }
    }

    /// Override the store deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.ledger = self.ledger.with_deadline(deadline);
        self
    }
}

#[async_trait]
impl<I> ActivationCommand for ActivationService<I>
where
    I: InvitationRepository,
{
    async fn activate(&self, token: &InvitationToken) -> Result<User, Error> {
        let user = self.ledger.resolve(token).await?;
        debug!(user_id = %user.id(), "user activated");
        Ok(user)
    }
}
