//! HS256 JSON Web Token codec.
//!
//! `jsonwebtoken`'s own temporal and audience checks are switched off: the
//! codec only proves the signature and the claim shape, and
//! [`TokenSigner`](crate::domain::TokenSigner) judges the rest against its
//! injected clock.

use std::collections::HashSet;
use std::fmt;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use zeroize::Zeroizing;

use crate::domain::ports::SessionTokenCodec;
use crate::domain::{SessionClaims, SignedToken, SigningError, TokenVerificationError};

/// Shortest secret accepted for production use.
pub const MIN_SECRET_BYTES: usize = 32;

/// Shared-secret JWT codec.
pub struct JwtCodec {
    secret: Zeroizing<Vec<u8>>,
    validation: Validation,
}

impl JwtCodec {
    /// Build a codec over `secret`. An empty secret is accepted here and
    /// reported as [`SigningError::KeyUnavailable`] on every signing attempt.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();
        Self {
            secret: Zeroizing::new(secret.into()),
            validation,
        }
    }
}

impl fmt::Debug for JwtCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtCodec")
            .field("secret", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl SessionTokenCodec for JwtCodec {
    fn sign(&self, claims: &SessionClaims) -> Result<SignedToken, SigningError> {
        if self.secret.is_empty() {
            return Err(SigningError::KeyUnavailable);
        }
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map(SignedToken::new)
        .map_err(|err| SigningError::Encoding {
            message: err.to_string(),
        })
    }

    fn decode(&self, token: &str) -> Result<SessionClaims, TokenVerificationError> {
        if self.secret.is_empty() {
            return Err(TokenVerificationError::BadSignature);
        }
        decode::<SessionClaims>(token, &DecodingKey::from_secret(&self.secret), &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenVerificationError::BadSignature
                }
                _ => TokenVerificationError::Malformed,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use chrono::{DateTime, TimeDelta, Utc};
    use rstest::{fixture, rstest};

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[fixture]
    fn claims() -> SessionClaims {
        let now = DateTime::<Utc>::from_timestamp(1_000, 0).expect("instant");
        SessionClaims::issue(UserId::new(5), now, TimeDelta::seconds(60), "social")
    }

    #[rstest]
    fn signed_claims_decode_unchanged(claims: SessionClaims) {
        let codec = JwtCodec::new(SECRET);
        let token = codec.sign(&claims).expect("signed");
        assert_eq!(codec.decode(token.as_str()).expect("decoded"), claims);
    }

    #[rstest]
    fn long_expired_claims_still_decode(claims: SessionClaims) {
        // The codec never judges time; the claims above expired in 1970.
        let codec = JwtCodec::new(SECRET);
        let token = codec.sign(&claims).expect("signed");
        assert!(codec.decode(token.as_str()).is_ok());
    }

    #[rstest]
    fn foreign_signatures_are_rejected(claims: SessionClaims) {
        let token = JwtCodec::new(b"another-secret-another-secret-xx".to_vec())
            .sign(&claims)
            .expect("signed");
        let err = JwtCodec::new(SECRET)
            .decode(token.as_str())
            .expect_err("wrong key");
        assert_eq!(err, TokenVerificationError::BadSignature);
    }

    #[rstest]
    #[case("not-a-token")]
    #[case("a.b.c")]
    fn garbage_is_malformed(#[case] token: &str) {
        let err = JwtCodec::new(SECRET).decode(token).expect_err("garbage");
        assert_eq!(err, TokenVerificationError::Malformed);
    }

    #[rstest]
    fn empty_secret_cannot_sign(claims: SessionClaims) {
        let err = JwtCodec::new(Vec::new()).sign(&claims).expect_err("no key");
        assert_eq!(err, SigningError::KeyUnavailable);
    }
}
