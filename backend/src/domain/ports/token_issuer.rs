//! Driving ports for session issuance and verification.
//!
//! Inbound adapters exchange credentials for a token through
//! [`TokenIssuer`] and resolve bearer tokens through [`SessionVerifier`],
//! without seeing the signing key.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Error, LoginCredentials, SignedToken, UserId};

/// A signed session token and its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Compact signed token.
    pub token: SignedToken,
    /// Instant the token stops verifying.
    pub expires_at: DateTime<Utc>,
}

/// Domain use-case port for authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Check credentials and issue a session token.
    async fn issue(&self, credentials: &LoginCredentials) -> Result<IssuedToken, Error>;
}

/// Resolves a presented bearer token to the user it authenticates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    /// Verify `token`; rejections map to [`ErrorCode::Unauthorized`](crate::domain::ErrorCode::Unauthorized).
    async fn verify(&self, token: &str) -> Result<UserId, Error>;
}
