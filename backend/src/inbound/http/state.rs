//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    ActivationCommand, FeedQueryService, FollowCommand, PostCommand, PostQuery,
    RegistrationCommand, SessionVerifier, TokenIssuer, UserQuery,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Account creation.
    pub registration: Arc<dyn RegistrationCommand>,
    /// Invitation redemption.
    pub activation: Arc<dyn ActivationCommand>,
    /// Credential exchange for session tokens.
    pub tokens: Arc<dyn TokenIssuer>,
    /// Bearer token verification used by the [`super::auth::AuthenticatedUser`]
    /// extractor.
    pub sessions: Arc<dyn SessionVerifier>,
    /// Public profile lookups.
    pub users: Arc<dyn UserQuery>,
    /// Follow graph mutations.
    pub follows: Arc<dyn FollowCommand>,
    /// Activity feed.
    pub feed: Arc<dyn FeedQueryService>,
    /// Post and comment mutations.
    pub posts: Arc<dyn PostCommand>,
    /// Post reads.
    pub posts_query: Arc<dyn PostQuery>,
}
