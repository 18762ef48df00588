//! Registration orchestrator.
//!
//! Runs validation, credential hashing, persistence of the user together with
//! its invitation, and delivery of the activation mail as one workflow:
//!
//! ```text
//! Validating -> CredentialHashed -> Persisted -> Invited -> MailSent
//!                                                   \
//!                                                    MailSendFailed -> UserDeleted
//! ```
//!
//! The user row and the invitation are written in one store transaction. The
//! mail cannot be part of that transaction, so a delivery failure is
//! compensated by deleting the user again (the invitation cascades).
//!
//! A pending account can ask for a fresh activation mail. That replaces its
//! invitation and needs no compensation: the account stays pending either
//! way.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use super::ports::{
    InvitationRepository, MailDeliveryError, MailMessage, MailSender, MailTemplate, Registration,
    RegistrationCommand, RegistrationRequest, UserPersistenceError, UserRepository,
};
use super::{
    CredentialError, CredentialVault, Deadline, DeadlineExceeded, Email, Error, InvitationError,
    InvitationLedger, InvitationToken, MintedInvitation, NewUser, Password,
    PasswordValidationError, User, UserValidationError, Username,
};

/// Environment name in which mail is delivered for real.
pub const PRODUCTION_ENVIRONMENT: &str = "production";

/// Workflow stages, logged as each one completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStage {
    /// Input is being validated.
    Validating,
    /// The password has been hashed.
    CredentialHashed,
    /// User and invitation are stored.
    Persisted,
    /// The activation mail is rendered and handed to the mailer.
    Invited,
    /// The mailer accepted the message.
    MailSent,
    /// The mailer failed; compensation starts.
    MailSendFailed,
    /// Compensation removed the user.
    UserDeleted,
}

impl RegistrationStage {
    /// Stage name as it appears in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::CredentialHashed => "credential_hashed",
            Self::Persisted => "persisted",
            Self::Invited => "invited",
            Self::MailSent => "mail_sent",
            Self::MailSendFailed => "mail_send_failed",
            Self::UserDeleted => "user_deleted",
        }
    }
}

impl fmt::Display for RegistrationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registration failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// Username or email failed validation.
    #[error(transparent)]
    InvalidUser(#[from] UserValidationError),
    /// Password failed validation.
    #[error(transparent)]
    InvalidPassword(#[from] PasswordValidationError),
    /// The username is taken.
    #[error("username is already taken")]
    DuplicateUsername,
    /// The email is registered already.
    #[error("email is already registered")]
    DuplicateEmail,
    /// Hashing failed.
    #[error(transparent)]
    Credential(#[from] CredentialError),
    /// The record store failed.
    #[error(transparent)]
    Store(UserPersistenceError),
    /// A replacement invitation could not be stored.
    #[error(transparent)]
    Invitation(#[from] InvitationError),
    /// The activation mail could not be delivered; a new registration was
    /// rolled back.
    #[error("activation mail failed: {0}")]
    MailDelivery(MailDeliveryError),
}

impl From<UserPersistenceError> for RegistrationError {
    fn from(value: UserPersistenceError) -> Self {
        match value {
            UserPersistenceError::DuplicateUsername => Self::DuplicateUsername,
            UserPersistenceError::DuplicateEmail => Self::DuplicateEmail,
            other => Self::Store(other),
        }
    }
}

impl From<DeadlineExceeded> for MailDeliveryError {
    fn from(value: DeadlineExceeded) -> Self {
        Self::transport(value.to_string())
    }
}

impl From<RegistrationError> for Error {
    fn from(value: RegistrationError) -> Self {
        match value {
            RegistrationError::InvalidUser(err) => {
                Error::invalid_field(err.field(), err.code(), err.to_string())
            }
            RegistrationError::InvalidPassword(err) => {
                Error::invalid_field("password", err.code(), err.to_string())
            }
            RegistrationError::DuplicateUsername => {
                Error::conflict("username is already taken").with_code("duplicate_username")
            }
            RegistrationError::DuplicateEmail => {
                Error::conflict("email is already registered").with_code("duplicate_email")
            }
            RegistrationError::Credential(err) => Error::internal(err.to_string()),
            RegistrationError::Store(err) => Error::from(err),
            RegistrationError::Invitation(err) => Error::from(err),
            RegistrationError::MailDelivery(err) => {
                Error::internal(format!("failed to send activation email: {err}"))
            }
        }
    }
}

/// Settings that shape the activation mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationSettings {
    frontend_url: String,
    sandbox: bool,
}

impl RegistrationSettings {
    /// Links point at `frontend_url`; mail is sandboxed unless `environment`
    /// is `production`.
    pub fn new(frontend_url: impl Into<String>, environment: &str) -> Self {
        Self {
            frontend_url: frontend_url.into(),
            sandbox: environment != PRODUCTION_ENVIRONMENT,
        }
    }

    /// Whether mail is sent in sandbox mode.
    pub fn sandbox(&self) -> bool {
        self.sandbox
    }

    /// Activation link for `token`.
    ///
    /// # Examples
    /// ```
    /// use social_backend::domain::{InvitationToken, RegistrationSettings};
    ///
    /// let settings = RegistrationSettings::new("https://social.test/", "production");
    /// let token = InvitationToken::from_presented("abc123");
    /// assert_eq!(settings.activation_url(&token), "https://social.test/confirm/abc123");
    /// ```
    pub fn activation_url(&self, token: &InvitationToken) -> String {
        format!(
            "{}/confirm/{}",
            self.frontend_url.trim_end_matches('/'),
            token.expose()
        )
    }
}

/// Coordinates credential vault, invitation ledger, record store and mailer.
#[derive(Clone)]
pub struct RegistrationOrchestrator<U, I, M> {
    users: Arc<U>,
    ledger: InvitationLedger<I>,
    mailer: Arc<M>,
    vault: CredentialVault,
    settings: RegistrationSettings,
    deadline: Deadline,
}

impl<U, I, M> RegistrationOrchestrator<U, I, M> {
    /// Wire the workflow's collaborators.
    pub fn new(
        users: Arc<U>,
        ledger: InvitationLedger<I>,
        mailer: Arc<M>,
        vault: CredentialVault,
        settings: RegistrationSettings,
    ) -> Self {
        Self {
            users,
            ledger,
            mailer,
            vault,
            settings,
            deadline: Deadline::default(),
        }
    }

    /// Override the store and mailer deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }
}

impl<U, I, M> RegistrationOrchestrator<U, I, M>
where
    U: UserRepository,
    M: MailSender,
{
    /// Run the workflow.
    pub async fn register(
        &self,
        mut request: RegistrationRequest,
    ) -> Result<Registration, RegistrationError> {
        debug!(stage = %RegistrationStage::Validating, "registration stage");
        let username = Username::new(&request.username)?;
        let email = Email::new(&request.email)?;
        let password = Password::new(std::mem::take(&mut *request.password))?;

        let password_hash = self.vault.set_off_thread(password).await?;
        debug!(stage = %RegistrationStage::CredentialHashed, "registration stage");

        let MintedInvitation { token, entry } = self.ledger.mint();
        let new_user = NewUser {
            username,
            email,
            password_hash,
        };
        let user = self
            .deadline
            .bound(
                "user.create_with_invitation",
                self.users.create_with_invitation(&new_user, &entry),
            )
            .await?;
        debug!(stage = %RegistrationStage::Persisted, user_id = %user.id(), "registration stage");

        let message = self.invitation_message(&user, &token);
        debug!(stage = %RegistrationStage::Invited, user_id = %user.id(), "registration stage");

        match self
            .deadline
            .bound("mail.send", self.mailer.send(&message))
            .await
        {
            Ok(status) => {
                debug!(
                    stage = %RegistrationStage::MailSent,
                    user_id = %user.id(),
                    ?status,
                    "registration stage"
                );
                Ok(Registration { user, token })
            }
            Err(err) => {
                warn!(
                    stage = %RegistrationStage::MailSendFailed,
                    user_id = %user.id(),
                    error = %err,
                    "activation mail failed; rolling back user"
                );
                self.compensate(&user).await;
                Err(RegistrationError::MailDelivery(err))
            }
        }
    }

    fn invitation_message(&self, user: &User, token: &InvitationToken) -> MailMessage {
        let mut vars = BTreeMap::new();
        vars.insert("username".to_owned(), user.username().to_string());
        vars.insert(
            "activation_url".to_owned(),
            self.settings.activation_url(token),
        );
        MailMessage {
            template: MailTemplate::UserInvitation,
            recipient_name: user.username().to_string(),
            recipient_address: user.email().clone(),
            vars,
            sandbox: self.settings.sandbox(),
        }
    }

    async fn compensate(&self, user: &User) {
        match self
            .deadline
            .bound("user.delete", self.users.delete(user.id()))
            .await
        {
            Ok(true) => {
                debug!(
                    stage = %RegistrationStage::UserDeleted,
                    user_id = %user.id(),
                    "registration stage"
                );
            }
            Ok(false) => {
                warn!(user_id = %user.id(), "user vanished before compensation");
            }
            Err(err) => {
                error!(
                    user_id = %user.id(),
                    error = %err,
                    "failed to delete user after activation mail failure"
                );
            }
        }
    }
}

impl<U, I, M> RegistrationOrchestrator<U, I, M>
where
    U: UserRepository,
    I: InvitationRepository,
    M: MailSender,
{
    /// Replace a pending account's invitation and mail the new link.
    ///
    /// Unknown and already active addresses succeed without side effects so
    /// the outcome does not reveal which emails are registered. The previous
    /// token stops working.
    pub async fn resend_invitation(&self, email: &str) -> Result<(), RegistrationError> {
        let address = Email::new(email)?;
        let found = self
            .deadline
            .bound("user.find_by_email", self.users.find_by_email(&address))
            .await?;
        let Some(user) = found else {
            debug!("activation resend skipped: unknown email");
            return Ok(());
        };
        if user.activation().is_active() {
            debug!(user_id = %user.id(), "activation resend skipped: already active");
            return Ok(());
        }

        let token = self.ledger.issue(user.id()).await?;
        let message = self.invitation_message(&user, &token);
        match self
            .deadline
            .bound("mail.send", self.mailer.send(&message))
            .await
        {
            Ok(status) => {
                debug!(user_id = %user.id(), ?status, "activation mail resent");
                Ok(())
            }
            Err(err) => {
                warn!(user_id = %user.id(), error = %err, "activation mail resend failed");
                Err(RegistrationError::MailDelivery(err))
            }
        }
    }
}

#[async_trait]
impl<U, I, M> RegistrationCommand for RegistrationOrchestrator<U, I, M>
where
    U: UserRepository,
    I: InvitationRepository,
    M: MailSender,
{
    async fn register(&self, request: RegistrationRequest) -> Result<Registration, Error> {
        RegistrationOrchestrator::register(self, request)
            .await
            .map_err(Error::from)
    }

    async fn resend_invitation(&self, email: &str) -> Result<(), Error> {
        RegistrationOrchestrator::resend_invitation(self, email)
            .await
            .map_err(Error::from)
    }
}
