//! Port for follow-edge persistence.
use async_trait::async_trait;

use crate::domain::FollowEdge;

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by follow repository adapters.
    pub enum FollowPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "follow repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "follow repository query failed: {message}",
        /// The edge already exists.
        DuplicateEdge => "follow edge already exists",
        /// One endpoint of the edge does not exist.
        UnknownUser => "follow edge references an unknown user",
    }
}

/// Single-row mutations on the directed follow relation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Insert an edge; a concurrent duplicate loses with
    /// [`FollowPersistenceError::DuplicateEdge`].
    async fn insert(&self, edge: FollowEdge) -> Result<(), FollowPersistenceError>;

    /// Remove an edge, returning whether one existed.
    async fn remove(&self, edge: FollowEdge) -> Result<bool, FollowPersistenceError>;
}
