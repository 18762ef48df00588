//! Domain primitives, services and ports.
//!
//! Purpose: define strongly typed entities and the use-case services of the
//! identity and social-graph core. Services depend only on the traits in
//! [`ports`]; inbound adapters call them through the driving ports, outbound
//! adapters implement the driven ones.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure taxonomy.
//! - CredentialVault, TokenSigner, InvitationLedger: leaf components.
//! - RegistrationOrchestrator, ActivationService, TokenIssuanceService,
//!   FollowerGraph, FeedEngine, PostService, UserDirectory: use-case services.

pub mod activation;
pub mod auth;
pub mod credentials;
pub mod deadline;
pub mod error;
pub mod feed;
pub mod follower_graph;
pub mod invitation;
pub mod ports;
pub mod post;
pub mod post_service;
pub mod registration;
pub mod session_token;
pub mod token_issuance;
pub mod trace_id;
pub mod user;
pub mod user_directory;

pub use self::activation::ActivationService;
pub use self::auth::{LoginCredentials, LoginValidationError};
pub use self::credentials::{
    CredentialCost, CredentialError, CredentialVault, PASSWORD_MAX, PASSWORD_MIN, Password,
    PasswordHash, PasswordValidationError,
};
pub use self::deadline::{DEFAULT_DEADLINE, Deadline, DeadlineExceeded};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::feed::{
    DEFAULT_FEED_LIMIT, DEFAULT_FEED_MAX_LIMIT, FEED_TAGS_MAX, FeedEngine, FeedEntry, FeedError,
    FeedQuery, FeedValidationError, RawFeedParams, SEARCH_MAX, SortDirection,
};
pub use self::follower_graph::{FollowEdge, FollowError, FollowerGraph};
pub use self::invitation::{
    DEFAULT_INVITATION_TTL_SECS, InvitationDigest, InvitationError, InvitationLedger,
    InvitationToken, MintedInvitation, NewInvitation, TOKEN_BYTES,
};
pub use self::post::{
    COMMENT_MAX, CONTENT_MAX, Comment, CommentBody, CommentId, Content, NewComment, NewPost, Post,
    PostChanges, PostId, PostThread, PostValidationError, TAG_MAX, TAGS_MAX, TITLE_MAX, Tags,
    Title,
};
pub use self::post_service::PostService;
pub use self::registration::{
    PRODUCTION_ENVIRONMENT, RegistrationError, RegistrationOrchestrator, RegistrationSettings,
    RegistrationStage,
};
pub use self::session_token::{
    DEFAULT_SESSION_TTL_SECS, SessionClaims, SignedToken, SigningError, TokenSigner,
    TokenVerificationError,
};
pub use self::token_issuance::TokenIssuanceService;
pub use self::trace_id::TraceId;
pub use self::user::{
    ActivationState, EMAIL_MAX, Email, NewUser, USERNAME_MAX, User, UserId, UserRecord,
    UserValidationError, Username,
};
pub use self::user_directory::UserDirectory;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use social_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
