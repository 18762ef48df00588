//! PostgreSQL persistence adapters using Diesel.
//!
//! Repositories are thin: they translate between Diesel rows and domain
//! types and classify database failures. Uniqueness of usernames, emails and
//! follow edges is left to the database's constraints, which makes the
//! checks atomic under concurrency.
//!
//! # Example
//!
//! ```ignore
//! use social_backend::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::connect(&PoolConfig::new("postgres://localhost/social")).await?;
//! let users = DieselUserRepository::new(pool.clone());
//! ```

mod diesel_error_mapping;
mod diesel_feed_repository;
mod diesel_follow_repository;
mod diesel_invitation_repository;
mod diesel_post_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_feed_repository::DieselFeedRepository;
pub use diesel_follow_repository::DieselFollowRepository;
pub use diesel_invitation_repository::DieselInvitationRepository;
pub use diesel_post_repository::DieselPostRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{
    DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_MAX_CONNECTIONS, DEFAULT_MIN_IDLE, DbPool, PoolConfig,
    PoolError, PooledPg,
};
