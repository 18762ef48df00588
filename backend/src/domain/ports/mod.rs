//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, mail sender, token codec) are implemented by
//! outbound adapters. Driving ports (commands and queries) are implemented by
//! domain services and consumed by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod feed_query;
mod feed_repository;
mod follow_command;
mod follow_repository;
mod invitation_repository;
mod mail_sender;
mod post_command;
mod post_repository;
mod registration_command;
mod session_token_codec;
mod store_probe;
mod token_issuer;
mod user_query;
mod user_repository;

#[cfg(test)]
pub use feed_query::MockFeedQueryService;
pub use feed_query::{FeedPage, FeedQueryService};
#[cfg(test)]
pub use feed_repository::MockFeedRepository;
pub use feed_repository::{FeedPersistenceError, FeedRepository};
pub use follow_command::FollowCommand;
#[cfg(test)]
pub use follow_command::MockFollowCommand;
#[cfg(test)]
pub use follow_repository::MockFollowRepository;
pub use follow_repository::{FollowPersistenceError, FollowRepository};
#[cfg(test)]
pub use invitation_repository::MockInvitationRepository;
pub use invitation_repository::{
    InvitationLookup, InvitationPersistenceError, InvitationRepository,
};
#[cfg(test)]
pub use mail_sender::MockMailSender;
pub use mail_sender::{
    DeliveryStatus, MailDeliveryError, MailMessage, MailSender, MailTemplate,
};
pub use post_command::{CreatePostRequest, PostCommand, PostQuery, UpdatePostRequest};
#[cfg(test)]
pub use post_command::{MockPostCommand, MockPostQuery};
#[cfg(test)]
pub use post_repository::MockPostRepository;
pub use post_repository::{PostPersistenceError, PostRepository};
#[cfg(test)]
pub use registration_command::{MockActivationCommand, MockRegistrationCommand};
pub use registration_command::{
    ActivationCommand, Registration, RegistrationCommand, RegistrationRequest,
};
#[cfg(test)]
pub use session_token_codec::MockSessionTokenCodec;
pub use session_token_codec::SessionTokenCodec;
#[cfg(test)]
pub use store_probe::MockStoreProbe;
pub use store_probe::{StoreProbe, StoreProbeError};
#[cfg(test)]
pub use token_issuer::{MockSessionVerifier, MockTokenIssuer};
pub use token_issuer::{IssuedToken, SessionVerifier, TokenIssuer};
#[cfg(test)]
pub use user_query::MockUserQuery;
pub use user_query::UserQuery;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
