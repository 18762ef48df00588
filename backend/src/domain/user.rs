//! User data model.
//!
//! Usernames and email addresses are validated on construction so the rest of
//! the domain can rely on their invariants. Passwords never appear here; the
//! only credential material a [`User`] carries is the one-way
//! [`PasswordHash`](crate::domain::PasswordHash).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::credentials::PasswordHash;

/// Maximum username length, in characters.
pub const USERNAME_MAX: usize = 100;
/// Maximum email length, in characters.
pub const EMAIL_MAX: usize = 255;

/// Validation errors for user identity fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// The user id was not a positive integer.
    #[error("user id must be a positive integer")]
    InvalidId,
    /// The username was blank.
    #[error("username must not be empty")]
    EmptyUsername,
    /// The username exceeded [`USERNAME_MAX`].
    #[error("username must be at most {max} characters")]
    UsernameTooLong {
        /// Maximum permitted length.
        max: usize,
    },
    /// The email was blank.
    #[error("email must not be empty")]
    EmptyEmail,
    /// The email exceeded [`EMAIL_MAX`].
    #[error("email must be at most {max} characters")]
    EmailTooLong {
        /// Maximum permitted length.
        max: usize,
    },
    /// The email was not shaped like `local@domain.tld`.
    #[error("email must be a valid address")]
    InvalidEmail,
}

impl UserValidationError {
    /// Request field the failure belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidId => "id",
            Self::EmptyUsername | Self::UsernameTooLong { .. } => "username",
            Self::EmptyEmail | Self::EmailTooLong { .. } | Self::InvalidEmail => "email",
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidId => "invalid_user_id",
            Self::EmptyUsername => "empty_username",
            Self::UsernameTooLong { .. } => "username_too_long",
            Self::EmptyEmail => "empty_email",
            Self::EmailTooLong { .. } => "email_too_long",
            Self::InvalidEmail => "invalid_email",
        }
    }
}

/// Opaque numeric user identifier assigned by the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a store-assigned identifier.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw identifier value.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<i64>() {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(UserValidationError::InvalidId),
        }
    }
}

/// Unique public handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a [`Username`]. Surrounding whitespace is
    /// trimmed.
    ///
    /// # Examples
    /// ```
    /// use social_backend::domain::Username;
    ///
    /// let name = Username::new("  ada  ").expect("valid username");
    /// assert_eq!(name.as_ref(), "ada");
    /// assert!(Username::new(" ").is_err());
    /// ```
    pub fn new(username: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = username.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        if trimmed.chars().count() > USERNAME_MAX {
            return Err(UserValidationError::UsernameTooLong { max: USERNAME_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl TryFrom<String> for Username {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Unique email address, normalised to lower case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and construct an [`Email`].
    ///
    /// # Examples
    /// ```
    /// use social_backend::domain::Email;
    ///
    /// let email = Email::new("Ada@Example.COM").expect("valid email");
    /// assert_eq!(email.as_ref(), "ada@example.com");
    /// assert!(Email::new("ada@").is_err());
    /// ```
    pub fn new(email: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = email.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if trimmed.chars().count() > EMAIL_MAX {
            return Err(UserValidationError::EmailTooLong { max: EMAIL_MAX });
        }
        if !is_plausible_address(trimmed) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(trimmed.to_lowercase()))
    }
}

fn is_plausible_address(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Whether the account has completed email activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivationState {
    /// Registered, awaiting invitation redemption.
    Pending,
    /// Invitation redeemed.
    Active,
}

impl ActivationState {
    /// Map the store's boolean flag to a state.
    pub const fn from_active_flag(active: bool) -> Self {
        if active { Self::Active } else { Self::Pending }
    }

    /// `true` once activated.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Persisted user account.
///
/// ## Invariants
/// - `username` and `email` are unique across all users (enforced by the
///   record store).
/// - `password_hash` is always a one-way hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    username: Username,
    email: Email,
    password_hash: PasswordHash,
    activation: ActivationState,
    created_at: DateTime<Utc>,
}

/// Field bundle used to rebuild a [`User`] from storage.
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// Store-assigned identifier.
    pub id: UserId,
    /// Unique username.
    pub username: Username,
    /// Unique email address.
    pub email: Email,
    /// Stored password hash.
    pub password_hash: PasswordHash,
    /// Activation state.
    pub activation: ActivationState,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        let UserRecord {
            id,
            username,
            email,
            password_hash,
            activation,
            created_at,
        } = record;
        Self {
            id,
            username,
            email,
            password_hash,
            activation,
            created_at,
        }
    }
}

impl User {
    /// Store-assigned identifier.
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Unique username.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Unique email address.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Stored password hash.
    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    /// Activation state.
    pub fn activation(&self) -> ActivationState {
        self.activation
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Return a copy marked as active.
    #[must_use]
    pub fn activated(mut self) -> Self {
        self.activation = ActivationState::Active;
        self
    }
}

/// Validated account fields ready for insertion.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Unique username.
    pub username: Username,
    /// Unique email address.
    pub email: Email,
    /// Hash produced by the credential vault.
    pub password_hash: PasswordHash,
}
