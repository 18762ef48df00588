//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::http::header::AUTHORIZATION;

use crate::domain::ports::{
    MockActivationCommand, MockFeedQueryService, MockFollowCommand, MockPostCommand,
    MockPostQuery, MockRegistrationCommand, MockSessionVerifier, MockTokenIssuer, MockUserQuery,
};
use crate::domain::{User, UserId};

use super::state::HttpState;

/// Mocked driving ports; set expectations, then call [`TestPorts::into_state`].
#[derive(Default)]
pub struct TestPorts {
    pub registration: MockRegistrationCommand,
    pub activation: MockActivationCommand,
    pub tokens: MockTokenIssuer,
    pub sessions: MockSessionVerifier,
    pub users: MockUserQuery,
    pub follows: MockFollowCommand,
    pub feed: MockFeedQueryService,
    pub posts: MockPostCommand,
    pub posts_query: MockPostQuery,
}

impl TestPorts {
    /// Ports whose session verifier accepts any token as `caller`.
    pub fn signed_in_as(caller: i64) -> Self {
        let mut ports = Self::default();
        ports
            .sessions
            .expect_verify()
            .returning(move |_| Ok(UserId::new(caller)));
        ports
    }

    pub fn into_state(self) -> HttpState {
        HttpState {
            registration: Arc::new(self.registration),
            activation: Arc::new(self.activation),
            tokens: Arc::new(self.tokens),
            sessions: Arc::new(self.sessions),
            users: Arc::new(self.users),
            follows: Arc::new(self.follows),
            feed: Arc::new(self.feed),
            posts: Arc::new(self.posts),
            posts_query: Arc::new(self.posts_query),
        }
    }
}

/// `Authorization` header carrying `token`.
pub fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {token}"))
}

/// A pending user with deterministic fields.
pub fn sample_user(id: i64, name: &str) -> User {
    use crate::domain::{ActivationState, Email, PasswordHash, UserRecord, Username};
    use chrono::{DateTime, Utc};

    User::from(UserRecord {
        id: UserId::new(id),
        username: Username::new(name).expect("username"),
        email: Email::new(format!("{name}@example.com")).expect("email"),
        password_hash: PasswordHash::from_phc("$argon2id$stub"),
        activation: ActivationState::Pending,
        created_at: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).expect("timestamp"),
    })
}
