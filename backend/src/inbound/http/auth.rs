//! Bearer-token authentication extractor.
//!
//! Handlers that need a caller take an [`AuthenticatedUser`] argument. The
//! extractor reads `Authorization: Bearer <token>`, verifies it through the
//! [`SessionVerifier`](crate::domain::ports::SessionVerifier) port held in
//! [`HttpState`] and yields the caller's id, so handlers never inspect headers
//! themselves.

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use tracing::debug;

use crate::domain::{Error, UserId};

use super::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";

/// Identity of the caller, established from a verified session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(UserId);

impl AuthenticatedUser {
    /// The caller's user id.
    #[must_use]
    pub fn id(self) -> UserId {
        self.0
    }
}

fn bearer_token(req: &HttpRequest) -> Result<String, Error> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized("missing bearer token").with_code("missing_token"))?;
    let value = header.to_str().map_err(|_| {
        Error::unauthorized("malformed authorization header").with_code("malformed_token")
    })?;
    value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| Error::unauthorized("missing bearer token").with_code("missing_token"))
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let token = bearer_token(req);
        Box::pin(async move {
            let http_state =
                state.ok_or_else(|| Error::internal("HTTP state is not registered"))?;
            let bearer = token?;
            let user = http_state.sessions.verify(&bearer).await.inspect_err(|err| {
                debug!(code = ?err.code(), "bearer token rejected");
            })?;
            Ok(Self(user))
        })
    }
}
