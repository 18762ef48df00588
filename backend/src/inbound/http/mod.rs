//! HTTP inbound adapter exposing REST endpoints.
//!
//! Handlers depend only on the driving ports held in [`state::HttpState`];
//! authentication is a bearer token resolved by [`auth::AuthenticatedUser`].

pub mod auth;
pub mod error;
pub mod feed;
pub mod health;
pub mod posts;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod tokens;
pub mod users;
pub mod validation;

pub use error::ApiResult;
