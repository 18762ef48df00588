//! Credential vault: one-way password hashing and verification.
//!
//! Hashes are argon2id PHC strings, so salt and cost parameters travel with
//! each stored hash and verification keeps working after the configured cost
//! changes. Plaintext passwords only live in [`Zeroizing`] buffers.

use std::fmt;

use argon2::{Algorithm, Argon2, Params, Version};
use password_hash::rand_core::{OsRng, RngCore};
use password_hash::{PasswordHash as PhcHash, PasswordHasher, PasswordVerifier, SaltString};
use tracing::warn;
use zeroize::Zeroizing;

/// Minimum password length, in characters.
pub const PASSWORD_MIN: usize = 3;
/// Maximum password length, in characters.
pub const PASSWORD_MAX: usize = 72;

/// Password shape violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordValidationError {
    /// Fewer than [`PASSWORD_MIN`] characters.
    #[error("password must be at least {min} characters")]
    TooShort {
        /// Minimum permitted length.
        min: usize,
    },
    /// More than [`PASSWORD_MAX`] characters.
    #[error("password must be at most {max} characters")]
    TooLong {
        /// Maximum permitted length.
        max: usize,
    },
}

impl PasswordValidationError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TooShort { .. } => "password_too_short",
            Self::TooLong { .. } => "password_too_long",
        }
    }
}

/// Plaintext password accepted for hashing.
///
/// Whitespace is preserved. The buffer is wiped on drop and never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Validate length bounds and wrap the plaintext.
    ///
    /// # Examples
    /// ```
    /// use social_backend::domain::Password;
    ///
    /// assert!(Password::new("hunter2").is_ok());
    /// assert!(Password::new("no").is_err());
    /// ```
    pub fn new(plaintext: impl Into<String>) -> Result<Self, PasswordValidationError> {
        let secret = Zeroizing::new(plaintext.into());
        let length = secret.chars().count();
        if length < PASSWORD_MIN {
            return Err(PasswordValidationError::TooShort { min: PASSWORD_MIN });
        }
        if length > PASSWORD_MAX {
            return Err(PasswordValidationError::TooLong { max: PASSWORD_MAX });
        }
        Ok(Self(secret))
    }

    /// Borrow the plaintext.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// One-way password hash in PHC string format.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a PHC string read back from storage.
    pub fn from_phc(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    /// PHC string suitable for storage.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

/// Failures raised by the vault itself, never by caller input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    /// The hashing primitive failed.
    #[error("password encoding failed: {message}")]
    Encoding {
        /// Underlying failure description.
        message: String,
    },
    /// The configured cost parameters were rejected.
    #[error("invalid credential cost parameters: {message}")]
    InvalidCost {
        /// Underlying failure description.
        message: String,
    },
}

/// Argon2 work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialCost {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl Default for CredentialCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl CredentialCost {
    /// Smallest parameters argon2 accepts; only suitable for tests.
    pub const fn minimal() -> Self {
        Self {
            memory_kib: Params::MIN_M_COST,
            iterations: Params::MIN_T_COST,
            parallelism: Params::MIN_P_COST,
        }
    }
}

/// Salted, cost-parameterised password hasher.
///
/// # Examples
/// ```
/// use social_backend::domain::{CredentialCost, CredentialVault, Password};
///
/// let vault = CredentialVault::new(CredentialCost::minimal()).expect("valid cost");
/// let password = Password::new("correct horse").expect("valid password");
/// let hash = vault.set(&password).expect("hashing succeeds");
/// assert!(vault.verify("correct horse", &hash));
/// assert!(!vault.verify("wrong horse", &hash));
/// ```
#[derive(Clone)]
pub struct CredentialVault {
    params: Params,
    decoy: PasswordHash,
}

impl CredentialVault {
    /// Build a vault with the given work factor.
    pub fn new(cost: CredentialCost) -> Result<Self, CredentialError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|err| CredentialError::InvalidCost {
                message: err.to_string(),
            })?;
        let mut secret = Zeroizing::new([0_u8; 32]);
        OsRng.fill_bytes(&mut *secret);
        let decoy = hash_bytes(&hasher_for(params.clone()), secret.as_slice())?;
        Ok(Self { params, decoy })
    }

    fn hasher(&self) -> Argon2<'static> {
        hasher_for(self.params.clone())
    }

    /// Hash `password` with a fresh random salt.
    pub fn set(&self, password: &Password) -> Result<PasswordHash, CredentialError> {
        hash_bytes(&self.hasher(), password.expose().as_bytes())
    }

    /// Hash of a random secret at the configured cost.
    ///
    /// Verifying against it costs as much as a real check but never
    /// succeeds, so login attempts for unknown accounts take as long as
    /// wrong passwords.
    pub fn decoy_hash(&self) -> PasswordHash {
        self.decoy.clone()
    }

    /// Check `plaintext` against a stored hash.
    ///
    /// An unparseable stored hash verifies as `false`.
    pub fn verify(&self, plaintext: &str, hash: &PasswordHash) -> bool {
        match PhcHash::new(hash.as_str()) {
            Ok(parsed) => self
                .hasher()
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok(),
            Err(err) => {
                warn!(error = %err, "stored password hash is not a valid PHC string");
                false
            }
        }
    }

    /// [`Self::set`] on the blocking thread pool.
    pub async fn set_off_thread(
        &self,
        password: Password,
    ) -> Result<PasswordHash, CredentialError> {
        let vault = self.clone();
        tokio::task::spawn_blocking(move || vault.set(&password))
            .await
            .map_err(|err| CredentialError::Encoding {
                message: err.to_string(),
            })?
    }

    /// [`Self::verify`] on the blocking thread pool. A failed join verifies as
    /// `false`.
    pub async fn verify_off_thread(
        &self,
        plaintext: Zeroizing<String>,
        hash: PasswordHash,
    ) -> bool {
        let vault = self.clone();
        match tokio::task::spawn_blocking(move || vault.verify(&plaintext, &hash)).await {
            Ok(matches) => matches,
            Err(err) => {
                warn!(error = %err, "password verification task failed");
                false
            }
        }
    }
}

fn hasher_for(params: Params) -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}

fn hash_bytes(hasher: &Argon2<'_>, input: &[u8]) -> Result<PasswordHash, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    hasher
        .hash_password(input, &salt)
        .map(|hash| PasswordHash(hash.to_string()))
        .map_err(|err| CredentialError::Encoding {
            message: err.to_string(),
        })
}
