//! Port for posts, comments and likes.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Comment, NewComment, NewPost, Post, PostChanges, PostId, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by post repository adapters.
    pub enum PostPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "post repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "post repository query failed: {message}",
        /// The referenced post does not exist.
        MissingPost => "post does not exist",
    }
}

/// Record-store operations on posts and their engagement.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a post and return it with its identifier.
    async fn insert(&self, post: &NewPost) -> Result<Post, PostPersistenceError>;

    /// Fetch a post by identifier.
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, PostPersistenceError>;

    /// Apply changes, returning the updated post when it exists.
    async fn update(
        &self,
        id: PostId,
        changes: &PostChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Post>, PostPersistenceError>;

    /// Delete a post, returning whether one existed.
    async fn delete(&self, id: PostId) -> Result<bool, PostPersistenceError>;

    /// Insert a comment on an existing post.
    async fn insert_comment(&self, comment: &NewComment) -> Result<Comment, PostPersistenceError>;

    /// Comments on a post, oldest first.
    async fn comments_for(&self, id: PostId) -> Result<Vec<Comment>, PostPersistenceError>;

    /// Record that `user` likes the post. Repeated likes are ignored.
    async fn add_like(&self, id: PostId, user: UserId) -> Result<(), PostPersistenceError>;
}
