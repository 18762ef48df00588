//! Port for the signing primitive behind session tokens.
//!
//! Adapters only sign and check signatures. Temporal and issuer checks stay
//! in [`TokenSigner`](crate::domain::TokenSigner) so their order is fixed in
//! one place.

use crate::domain::{SessionClaims, SignedToken, SigningError, TokenVerificationError};

/// Signs claims and decodes signature-verified tokens.
#[cfg_attr(test, mockall::automock)]
pub trait SessionTokenCodec: Send + Sync {
    /// Produce a signed token for `claims`.
    fn sign(&self, claims: &SessionClaims) -> Result<SignedToken, SigningError>;

    /// Check the signature and decode the claims without judging their
    /// validity window or audience.
    ///
    /// Fails with [`TokenVerificationError::BadSignature`] or
    /// [`TokenVerificationError::Malformed`] only.
    fn decode(&self, token: &str) -> Result<SessionClaims, TokenVerificationError>;
}
