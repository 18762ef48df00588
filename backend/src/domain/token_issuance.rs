//! Exchanges login credentials for a signed session token.
//!
//! Unknown email, wrong password and not-yet-activated accounts all produce
//! the same `unauthorized` response so callers cannot probe which accounts
//! exist.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::TimeDelta;
use tracing::{debug, error};
use zeroize::Zeroizing;

use super::ports::{IssuedToken, TokenIssuer, UserRepository};
use super::{
    CredentialVault, Deadline, Email, Error, LoginCredentials, SessionClaims, TokenSigner,
};

const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Authentication service implementing [`TokenIssuer`].
#[derive(Clone)]
pub struct TokenIssuanceService<U> {
    users: Arc<U>,
    vault: CredentialVault,
    signer: TokenSigner,
    ttl: TimeDelta,
    deadline: Deadline,
}

impl<U> TokenIssuanceService<U> {
    /// Build the service; issued tokens live for `ttl`.
    pub fn new(users: Arc<U>, vault: CredentialVault, signer: TokenSigner, ttl: TimeDelta) -> Self {
        Self {
            users,
            vault,
            signer,
            ttl,
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
impl<U> TokenIssuer for TokenIssuanceService<U>
where
    U: UserRepository,
{
    async fn issue(&self, credentials: &LoginCredentials) -> Result<IssuedToken, Error> {
        let Ok(email) = Email::new(credentials.email()) else {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };
        let found = self
            .deadline
            .bound("user.find_by_email", self.users.find_by_email(&email))
            .await?;
        let Some(user) = found else {
            // Pay for one argon2 check so timing matches a wrong password.
            self.vault
                .verify_off_thread(
                    Zeroizing::new(credentials.password().to_owned()),
                    self.vault.decoy_hash(),
                )
                .await;
            debug!("token refused: unknown email");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };

        let matches = self
            .vault
            .verify_off_thread(
                Zeroizing::new(credentials.password().to_owned()),
                user.password_hash().clone(),
            )
            .await;
        if !matches {
            debug!(user_id = %user.id(), "token refused: wrong password");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }
        if !user.activation().is_active() {
            debug!(user_id = %user.id(), "token refused: account pending activation");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }

        let claims = SessionClaims::issue(
            user.id(),
            self.signer.now(),
            self.ttl,
            self.signer.issuer(),
        );
        let expires_at = claims
            .expires_at()
            .ok_or_else(|| Error::internal("token expiry is out of range"))?;
        let token = self.signer.generate(&claims).map_err(|err| {
            error!(error = %err, "session token signing failed");
            Error::internal("failed to issue token")
        })?;
        debug!(user_id = %user.id(), %expires_at, "session token issued");
        Ok(IssuedToken { token, expires_at })
    }
}
