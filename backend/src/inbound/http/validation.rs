//! Shared validation helpers for inbound HTTP adapters.
//!
//! Path segments arrive as strings so malformed identifiers produce the same
//! JSON error envelope as every other validation failure instead of Actix's
//! plain-text extractor errors.

use std::str::FromStr;

use crate::domain::{Error, LoginValidationError};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidId,
}

impl ErrorCode {
    const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidId => "invalid_id",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    const fn as_str(self) -> &'static str {
        self.0
    }
}

pub(crate) fn invalid_id_error(field: FieldName) -> Error {
    let name = field.as_str();
    Error::invalid_field(
        name,
        ErrorCode::InvalidId.as_str(),
        format!("{name} must be a positive integer"),
    )
}

/// Parse a numeric identifier from a path segment.
pub(crate) fn parse_id<T: FromStr>(raw: &str, field: FieldName) -> Result<T, Error> {
    raw.trim().parse().map_err(|_| invalid_id_error(field))
}

pub(crate) fn login_validation_error(err: &LoginValidationError) -> Error {
    Error::invalid_field(err.field(), err.code(), err.to_string())
}
