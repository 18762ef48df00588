//! Session tokens: signed, stateless claims proving a caller's identity.
//!
//! The signing primitive sits behind [`SessionTokenCodec`]; this module owns
//! the claim shape and the verification order (signature, expiry, not-before,
//! issuer, audience) so every adapter reports failures the same way.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ports::{SessionTokenCodec, SessionVerifier};
use super::{Error, UserId};

/// Default session lifetime in seconds (three days).
pub const DEFAULT_SESSION_TTL_SECS: i64 = 3 * 24 * 60 * 60;

/// Claims carried by a session token. Temporal claims are seconds since the
/// Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Authenticated user.
    pub sub: UserId,
    /// Issued at.
    pub iat: i64,
    /// Not valid before.
    pub nbf: i64,
    /// Expires at.
    pub exp: i64,
    /// Issuer.
    pub iss: String,
    /// Audience.
    pub aud: String,
}

impl SessionClaims {
    /// Claims for `sub` valid from `now` for `ttl`, with issuer and audience
    /// both set to `issuer`.
    ///
    /// # Examples
    /// ```
    /// use chrono::{TimeDelta, TimeZone, Utc};
    /// use social_backend::domain::{SessionClaims, UserId};
    ///
    /// let now = Utc.timestamp_opt(1_000, 0).single().expect("valid instant");
    /// let claims = SessionClaims::issue(UserId::new(7), now, TimeDelta::seconds(60), "social");
    /// assert_eq!((claims.iat, claims.nbf, claims.exp), (1_000, 1_000, 1_060));
    /// assert_eq!(claims.aud, "social");
    /// ```
    pub fn issue(sub: UserId, now: DateTime<Utc>, ttl: TimeDelta, issuer: &str) -> Self {
        let iat = now.timestamp();
        Self {
            sub,
            iat,
            nbf: iat,
            exp: iat + ttl.num_seconds(),
            iss: issuer.to_owned(),
            aud: issuer.to_owned(),
        }
    }

    /// Expiry as a timestamp.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Compact signed token as handed to clients.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignedToken(String);

impl SignedToken {
    /// Wrap an encoded token.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Encoded form.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for SignedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SignedToken(<redacted>)")
    }
}

impl From<SignedToken> for String {
    fn from(value: SignedToken) -> Self {
        value.0
    }
}

/// Reasons a presented token is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenVerificationError {
    /// `exp` is not in the future.
    #[error("token has expired")]
    Expired,
    /// `nbf` is in the future.
    #[error("token is not yet valid")]
    NotYetValid,
    /// The signature does not match.
    #[error("token signature is invalid")]
    BadSignature,
    /// The token could not be decoded.
    #[error("token is malformed")]
    Malformed,
    /// `iss` does not match the configured issuer.
    #[error("token issuer is not accepted")]
    WrongIssuer,
    /// `aud` does not match the configured audience.
    #[error("token audience is not accepted")]
    WrongAudience,
}

impl TokenVerificationError {
    /// Stable machine-readable code.
    pub fn code(self) -> &'static str {
        match self {
            Self::Expired => "token_expired",
            Self::NotYetValid => "token_not_yet_valid",
            Self::BadSignature => "bad_signature",
            Self::Malformed => "malformed_token",
            Self::WrongIssuer => "wrong_issuer",
            Self::WrongAudience => "wrong_audience",
        }
    }
}

impl From<TokenVerificationError> for Error {
    fn from(value: TokenVerificationError) -> Self {
        Error::unauthorized(value.to_string()).with_code(value.code())
    }
}

/// Failures while producing a token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SigningError {
    /// No signing key is configured.
    #[error("signing key is unavailable")]
    KeyUnavailable,
    /// The signing primitive failed.
    #[error("token encoding failed: {message}")]
    Encoding {
        /// Underlying failure description.
        message: String,
    },
}

/// Issues and verifies session tokens against an injected clock.
#[derive(Clone)]
pub struct TokenSigner {
    codec: Arc<dyn SessionTokenCodec>,
    clock: Arc<dyn Clock>,
    issuer: String,
}

impl TokenSigner {
    /// Build a signer. `issuer` is used for both `iss` and `aud`.
    pub fn new(
        codec: Arc<dyn SessionTokenCodec>,
        clock: Arc<dyn Clock>,
        issuer: impl Into<String>,
    ) -> Self {
        Self {
            codec,
            clock,
            issuer: issuer.into(),
        }
    }

    /// Configured issuer.
    pub fn issuer(&self) -> &str {
        self.issuer.as_str()
    }

    /// Current instant according to the injected clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    /// Sign `claims`.
    pub fn generate(&self, claims: &SessionClaims) -> Result<SignedToken, SigningError> {
        self.codec.sign(claims)
    }

    /// Verify `token` and return its claims.
    ///
    /// Checks run in a fixed order: signature, `exp`, `nbf`, `iss`, `aud`.
    /// A token expires at the instant `exp`, not one second later.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenVerificationError> {
        let claims = self.codec.decode(token)?;
        let now = self.clock.utc().timestamp();
        if now >= claims.exp {
            return Err(TokenVerificationError::Expired);
        }
        if claims.nbf > now {
            return Err(TokenVerificationError::NotYetValid);
        }
        if claims.iss != self.issuer {
            return Err(TokenVerificationError::WrongIssuer);
        }
        if claims.aud != self.issuer {
            return Err(TokenVerificationError::WrongAudience);
        }
        Ok(claims)
    }
}

#[async_trait]
impl SessionVerifier for TokenSigner {
    async fn verify(&self, token: &str) -> Result<UserId, Error> {
        TokenSigner::verify(self, token)
            .map(|claims| claims.sub)
            .map_err(|err| {
                debug!(reason = err.code(), "session token rejected");
                Error::from(err)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::MockSessionTokenCodec;
    use crate::test_support::clock::MutableClock;
    use rstest::rstest;

    const NOW: i64 = 1_700_000_000;

    fn clock_at(seconds: i64) -> Arc<dyn Clock> {
        Arc::new(MutableClock::at_timestamp(seconds))
    }

    fn claims(exp: i64, nbf: i64, iss: &str, aud: &str) -> SessionClaims {
        SessionClaims {
            sub: UserId::new(9),
            iat: nbf,
            nbf,
            exp,
            iss: iss.to_owned(),
            aud: aud.to_owned(),
        }
    }

    fn signer_decoding(decoded: Result<SessionClaims, TokenVerificationError>) -> TokenSigner {
        let mut codec = MockSessionTokenCodec::new();
        codec.expect_decode().return_once(move |_| decoded);
        TokenSigner::new(Arc::new(codec), clock_at(NOW), "social")
    }

    #[rstest]
    #[case(claims(NOW + 60, NOW, "social", "social"), None)]
    #[case(claims(NOW, NOW - 60, "social", "social"), Some(TokenVerificationError::Expired))]
    #[case(claims(NOW - 1, NOW + 60, "social", "social"), Some(TokenVerificationError::Expired))]
    #[case(
        claims(NOW + 120, NOW + 60, "social", "social"),
        Some(TokenVerificationError::NotYetValid)
    )]
    #[case(claims(NOW + 60, NOW, "other", "social"), Some(TokenVerificationError::WrongIssuer))]
    #[case(claims(NOW + 60, NOW, "social", "other"), Some(TokenVerificationError::WrongAudience))]
    fn verification_order(
        #[case] decoded: SessionClaims,
        #[case] expected: Option<TokenVerificationError>,
    ) {
        let result = signer_decoding(Ok(decoded.clone())).verify("token");
        match expected {
            None => assert_eq!(result, Ok(decoded)),
            Some(err) => assert_eq!(result, Err(err)),
        }
    }

    #[rstest]
    #[case(TokenVerificationError::BadSignature)]
    #[case(TokenVerificationError::Malformed)]
    fn codec_failures_short_circuit(#[case] err: TokenVerificationError) {
        assert_eq!(signer_decoding(Err(err)).verify("token"), Err(err));
    }

    #[rstest]
    fn generate_delegates_to_the_codec() {
        let mut codec = MockSessionTokenCodec::new();
        codec
            .expect_sign()
            .times(1)
            .return_once(|_| Ok(SignedToken::new("signed")));
        let signer = TokenSigner::new(Arc::new(codec), clock_at(NOW), "social");
        let claims = SessionClaims::issue(
            UserId::new(1),
            signer.now(),
            TimeDelta::seconds(DEFAULT_SESSION_TTL_SECS),
            signer.issuer(),
        );

        let token = signer.generate(&claims).expect("signed");
        assert_eq!(token.as_str(), "signed");
        assert_eq!(claims.exp - claims.iat, DEFAULT_SESSION_TTL_SECS);
    }

    #[rstest]
    #[tokio::test]
    async fn verifier_port_maps_rejections_to_unauthorized() {
        let signer = signer_decoding(Ok(claims(NOW - 10, NOW - 100, "social", "social")));
        let err = SessionVerifier::verify(&signer, "token")
            .await
            .expect_err("expired");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
        assert_eq!(
            err.details().and_then(|d| d["code"].as_str()),
            Some("token_expired")
        );
    }

    #[rstest]
    fn debug_output_hides_tokens() {
        assert_eq!(format!("{:?}", SignedToken::new("abc")), "SignedToken(<redacted>)");
    }
}
