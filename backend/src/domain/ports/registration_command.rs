//! Driving ports for account registration and activation.

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::{Error, InvitationToken, User};

/// Raw sign-up input; validated by the implementation before any side
/// effect.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    /// Requested username.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// Plaintext password.
    pub password: Zeroizing<String>,
}

/// A freshly registered, still pending account.
#[derive(Debug, Clone)]
pub struct Registration {
    /// The created user.
    pub user: User,
    /// Plaintext activation token, returned exactly once.
    pub token: InvitationToken,
}

/// Domain use-case port for creating accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistrationCommand: Send + Sync {
    /// Register a pending user and send its activation mail.
    async fn register(&self, request: RegistrationRequest) -> Result<Registration, Error>;

    /// Mail a fresh activation link to the pending account behind `email`.
    async fn resend_invitation(&self, email: &str) -> Result<(), Error>;
}

/// Domain use-case port for redeeming activation tokens.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActivationCommand: Send + Sync {
    /// Consume `token` and return the now active user.
    async fn activate(&self, token: &InvitationToken) -> Result<User, Error>;
}
