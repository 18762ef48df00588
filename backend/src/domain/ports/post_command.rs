//! Driving ports for posts and comments.

use async_trait::async_trait;

use crate::domain::{Comment, Error, Post, PostId, PostThread, UserId};

/// Raw post creation input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatePostRequest {
    /// Headline.
    pub title: String,
    /// Body.
    pub content: String,
    /// Free-text tags.
    pub tags: Vec<String>,
}

/// Raw partial post update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePostRequest {
    /// Replacement headline.
    pub title: Option<String>,
    /// Replacement body.
    pub content: Option<String>,
}

/// Domain use-case port for mutating posts on behalf of the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostCommand: Send + Sync {
    /// Publish a post authored by `author`.
    async fn create(&self, author: UserId, request: CreatePostRequest) -> Result<Post, Error>;

    /// Update a post the caller authored.
    async fn update(
        &self,
        caller: UserId,
        id: PostId,
        request: UpdatePostRequest,
    ) -> Result<Post, Error>;

    /// Delete a post the caller authored.
    async fn delete(&self, caller: UserId, id: PostId) -> Result<(), Error>;

    /// Comment on any existing post.
    async fn comment(&self, caller: UserId, id: PostId, content: String) -> Result<Comment, Error>;

    /// Like any existing post. Liking twice is a no-op.
    async fn like(&self, caller: UserId, id: PostId) -> Result<(), Error>;
}

/// Domain use-case port for reading posts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostQuery: Send + Sync {
    /// Fetch a post with its comments.
    async fn get(&self, id: PostId) -> Result<PostThread, Error>;
}
