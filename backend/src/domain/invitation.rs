//! Invitation ledger: single-use activation tokens.
//!
//! Only the SHA-256 digest of a token is ever stored, so a leaked ledger row
//! cannot activate an account by itself. The plaintext token is handed back
//! to the caller exactly once.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use tracing::debug;
use zeroize::Zeroizing;

use super::ports::{InvitationLookup, InvitationPersistenceError, InvitationRepository};
use super::{Deadline, DeadlineExceeded, User, UserId};

/// Bytes of entropy in a freshly generated token.
pub const TOKEN_BYTES: usize = 32;

/// Default invitation lifetime in seconds (three days).
pub const DEFAULT_INVITATION_TTL_SECS: i64 = 3 * 24 * 60 * 60;

/// Plaintext one-time activation token.
#[derive(Clone, PartialEq, Eq)]
pub struct InvitationToken(Zeroizing<String>);

impl InvitationToken {
    /// Generate a token from the operating system RNG.
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new([0_u8; TOKEN_BYTES]);
        OsRng.fill_bytes(bytes.as_mut());
        Self(Zeroizing::new(hex::encode(bytes.as_ref())))
    }

    /// Wrap a token presented by a client.
    pub fn from_presented(raw: impl Into<String>) -> Self {
        Self(Zeroizing::new(raw.into()))
    }

    /// Borrow the plaintext, e.g. to embed it in an activation link.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Deterministic one-way digest used as the ledger key.
    ///
    /// # Examples
    /// ```
    /// use social_backend::domain::InvitationToken;
    ///
    /// let token = InvitationToken::from_presented("abc");
    /// assert_eq!(token.digest(), InvitationToken::from_presented("abc").digest());
    /// assert_eq!(token.digest().as_str().len(), 64);
    /// ```
    pub fn digest(&self) -> InvitationDigest {
        InvitationDigest(hex::encode(Sha256::digest(self.0.as_bytes())))
    }
}

impl fmt::Debug for InvitationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InvitationToken(<redacted>)")
    }
}

/// Hex-encoded SHA-256 digest of an [`InvitationToken`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InvitationDigest(String);

impl InvitationDigest {
    /// Rebuild a digest read from storage.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// Hex representation.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Ledger entry awaiting persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvitation {
    /// Digest of the plaintext token.
    pub digest: InvitationDigest,
    /// Instant after which the entry no longer resolves.
    pub expires_at: DateTime<Utc>,
}

/// A freshly generated token together with the entry to persist for it.
#[derive(Debug, Clone)]
pub struct MintedInvitation {
    /// Plaintext for out-of-band delivery.
    pub token: InvitationToken,
    /// Digest and expiry to store.
    pub entry: NewInvitation,
}

/// Ledger failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvitationError {
    /// No entry matches (never issued, or already consumed).
    #[error("invitation not found")]
    NotFound,
    /// An entry matched but its expiry has passed.
    #[error("invitation expired")]
    Expired,
    /// The record store failed.
    #[error(transparent)]
    Store(#[from] InvitationPersistenceError),
}

impl From<DeadlineExceeded> for InvitationPersistenceError {
    fn from(value: DeadlineExceeded) -> Self {
        Self::connection(value.to_string())
    }
}

/// Issues and resolves single-use activation tokens.
#[derive(Clone)]
pub struct InvitationLedger<R> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
    ttl: TimeDelta,
    deadline: Deadline,
}

/// `now + ttl`, saturating at the latest representable instant.
fn expiry_after(now: DateTime<Utc>, ttl: TimeDelta) -> DateTime<Utc> {
    now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

impl<R> InvitationLedger<R> {
    /// Build a ledger over `repo` with the given token lifetime.
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>, ttl: TimeDelta) -> Self {
        Self {
            repo,
            clock,
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

    /// Generate a token and its ledger entry without persisting anything.
    ///
    /// Registration uses this so the user row and the entry can be written
    /// in a single store transaction.
    pub fn mint(&self) -> MintedInvitation {
        let token = InvitationToken::generate();
        let entry = NewInvitation {
            digest: token.digest(),
            expires_at: expiry_after(self.clock.utc(), self.ttl),
        };
        MintedInvitation { token, entry }
    }
}

impl<R> InvitationLedger<R>
where
    R: InvitationRepository,
{
    /// Issue a fresh token for an existing user, replacing any pending one.
    pub async fn issue(&self, user: UserId) -> Result<InvitationToken, InvitationError> {
        let MintedInvitation { token, entry } = self.mint();
        self.deadline
            .bound("invitation.create", self.repo.create(user, &entry))
            .await?;
        debug!(user_id = %user, expires_at = %entry.expires_at, "invitation issued");
        Ok(token)
    }

    /// Consume `token` and return the user it was issued for, now active.
    ///
    /// Succeeds at most once per token. Expired entries are deleted by the
    /// store as they are observed.
    pub async fn resolve(&self, token: &InvitationToken) -> Result<User, InvitationError> {
        let digest = token.digest();
        let now = self.clock.utc();
        let lookup = self
            .deadline
            .bound("invitation.redeem", self.repo.redeem(&digest, now))
            .await?;
        match lookup {
            InvitationLookup::Consumed(user) => {
                debug!(user_id = %user.id(), "invitation consumed");
                Ok(user)
            }
            InvitationLookup::Expired => {
                debug!("expired invitation purged");
                Err(InvitationError::Expired)
            }
            InvitationLookup::Missing => Err(InvitationError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests;
