//! Application settings loaded via OrthoConfig.
//!
//! Every key can come from the command line, the environment (`SOCIAL_*`) or
//! a configuration file. Unset keys fall back to the accessor defaults below.

use std::net::{AddrParseError, SocketAddr};
use std::time::Duration;

use chrono::TimeDelta;
use ortho_config::OrthoConfig;
use serde::Deserialize;

use social_backend::domain::{
    CredentialCost, DEFAULT_DEADLINE, DEFAULT_FEED_MAX_LIMIT, DEFAULT_INVITATION_TTL_SECS,
    DEFAULT_SESSION_TTL_SECS, PRODUCTION_ENVIRONMENT,
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_TOKEN_ISSUER: &str = "social";
const DEFAULT_MAIL_FROM_NAME: &str = "Social";
const DEFAULT_MAIL_FROM_ADDRESS: &str = "noreply@localhost";
/// Longest accepted session or activation token lifetime: one year.
const MAX_TTL_SECS: i64 = 366 * 24 * 60 * 60;
/// Longest accepted per-call store deadline: ten minutes.
const MAX_STORE_TIMEOUT_MS: u64 = 10 * 60 * 1000;

/// A configured value lies outside the range the server accepts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{key} must be between 1 and {max}, got {value}")]
pub struct OutOfRange {
    /// Setting name as written in the environment.
    pub key: &'static str,
    /// Rejected value.
    pub value: String,
    /// Largest accepted value.
    pub max: String,
}

fn ttl_from_secs(key: &'static str, secs: i64) -> Result<TimeDelta, OutOfRange> {
    let out_of_range = || OutOfRange {
        key,
        value: secs.to_string(),
        max: MAX_TTL_SECS.to_string(),
    };
    if !(1..=MAX_TTL_SECS).contains(&secs) {
        return Err(out_of_range());
    }
    TimeDelta::try_seconds(secs).ok_or_else(out_of_range)
}

/// Configuration values for the HTTP server and its adapters.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SOCIAL")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection string; the in-memory store is used when unset.
    pub database_url: Option<String>,
    /// Base URL that activation links point at.
    pub frontend_url: Option<String>,
    /// Deployment environment; mail is sandboxed outside `production`.
    pub environment: Option<String>,
    /// Shared secret for session token signatures.
    pub token_secret: Option<String>,
    /// `iss` claim written into and required from session tokens.
    pub token_issuer: Option<String>,
    /// Session token lifetime in seconds.
    pub token_ttl_secs: Option<i64>,
    /// Activation token lifetime in seconds.
    pub invitation_ttl_secs: Option<i64>,
    /// Bearer credential for the mail provider; mail is logged when unset.
    pub mail_api_key: Option<String>,
    /// Mail provider endpoint.
    pub mail_api_url: Option<String>,
    /// Envelope sender address.
    pub mail_from_address: Option<String>,
    /// Envelope sender display name.
    pub mail_from_name: Option<String>,
    /// Largest feed page a client may request.
    pub feed_max_limit: Option<u32>,
    /// Upper bound on each record store and mail call, in milliseconds.
    pub store_timeout_ms: Option<u64>,
    /// Argon2 memory cost in KiB.
    pub argon2_memory_kib: Option<u32>,
    /// Argon2 pass count.
    pub argon2_iterations: Option<u32>,
    /// Argon2 lane count.
    pub argon2_parallelism: Option<u32>,
}

impl AppSettings {
    /// Parse the configured bind address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AddrParseError> {
        self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR).parse()
    }

    /// Return the database URL when one is configured and non-blank.
    pub fn database_url(&self) -> Option<&str> {
        non_blank(self.database_url.as_deref())
    }

    /// Return the frontend base URL, falling back to the local dev server.
    pub fn frontend_url(&self) -> &str {
        self.frontend_url.as_deref().unwrap_or(DEFAULT_FRONTEND_URL)
    }

    /// Return the deployment environment name.
    pub fn environment(&self) -> &str {
        self.environment.as_deref().unwrap_or(DEFAULT_ENVIRONMENT)
    }

    /// Whether the process runs in production.
    pub fn is_production(&self) -> bool {
        self.environment() == PRODUCTION_ENVIRONMENT
    }

    /// Return the token secret when one is configured and non-blank.
    pub fn token_secret(&self) -> Option<&str> {
        non_blank(self.token_secret.as_deref())
    }

    /// Return the token issuer claim.
    pub fn token_issuer(&self) -> &str {
        self.token_issuer.as_deref().unwrap_or(DEFAULT_TOKEN_ISSUER)
    }

    /// Return the session token lifetime.
    ///
    /// # Errors
    /// Rejects lifetimes that are not positive or exceed one year.
    pub fn token_ttl(&self) -> Result<TimeDelta, OutOfRange> {
        ttl_from_secs(
            "SOCIAL_TOKEN_TTL_SECS",
            self.token_ttl_secs.unwrap_or(DEFAULT_SESSION_TTL_SECS),
        )
    }

    /// Return the activation token lifetime.
    ///
    /// # Errors
    /// Rejects lifetimes that are not positive or exceed one year.
    pub fn invitation_ttl(&self) -> Result<TimeDelta, OutOfRange> {
        ttl_from_secs(
            "SOCIAL_INVITATION_TTL_SECS",
            self.invitation_ttl_secs
                .unwrap_or(DEFAULT_INVITATION_TTL_SECS),
        )
    }

    /// Return the mail provider credential when one is configured and non-blank.
    pub fn mail_api_key(&self) -> Option<&str> {
        non_blank(self.mail_api_key.as_deref())
    }

    /// Return the mail provider endpoint, if configured.
    pub fn mail_api_url(&self) -> Option<&str> {
        non_blank(self.mail_api_url.as_deref())
    }

    /// Return the envelope sender address.
    pub fn mail_from_address(&self) -> &str {
        self.mail_from_address
            .as_deref()
            .unwrap_or(DEFAULT_MAIL_FROM_ADDRESS)
    }

    /// Return the envelope sender display name.
    pub fn mail_from_name(&self) -> &str {
        self.mail_from_name
            .as_deref()
            .unwrap_or(DEFAULT_MAIL_FROM_NAME)
    }

    /// Return the feed page size cap.
    pub fn feed_max_limit(&self) -> u32 {
        self.feed_max_limit.unwrap_or(DEFAULT_FEED_MAX_LIMIT)
    }

    /// Return the per-call store deadline.
    ///
    /// # Errors
    /// Rejects a zero timeout or one longer than ten minutes.
    pub fn store_timeout(&self) -> Result<Duration, OutOfRange> {
        match self.store_timeout_ms {
            None => Ok(DEFAULT_DEADLINE),
            Some(ms) if (1..=MAX_STORE_TIMEOUT_MS).contains(&ms) => Ok(Duration::from_millis(ms)),
            Some(ms) => Err(OutOfRange {
                key: "SOCIAL_STORE_TIMEOUT_MS",
                value: ms.to_string(),
                max: MAX_STORE_TIMEOUT_MS.to_string(),
            }),
        }
    }

    /// Return the Argon2 work factor, filling unset parts with the library defaults.
    pub fn credential_cost(&self) -> CredentialCost {
        let defaults = CredentialCost::default();
        CredentialCost {
            memory_kib: self.argon2_memory_kib.unwrap_or(defaults.memory_kib),
            iterations: self.argon2_iterations.unwrap_or(defaults.iterations),
            parallelism: self.argon2_parallelism.unwrap_or(defaults.parallelism),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|raw| !raw.trim().is_empty())
}
