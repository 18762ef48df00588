//! Post service implementing the post driving ports.
//!
//! Mutations are scoped to the authenticated caller: only a post's author may
//! update or delete it. Reading, commenting and liking are open to any
//! authenticated user.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::debug;

use super::ports::{
    CreatePostRequest, PostCommand, PostPersistenceError, PostQuery, PostRepository,
    UpdatePostRequest,
};
use super::{
    Comment, CommentBody, Content, Deadline, DeadlineExceeded, Error, NewComment, NewPost, Post,
    PostChanges, PostId, PostThread, PostValidationError, Tags, Title, UserId,
};

impl From<DeadlineExceeded> for PostPersistenceError {
    fn from(value: DeadlineExceeded) -> Self {
        Self::connection(value.to_string())
    }
}

impl From<PostValidationError> for Error {
    fn from(value: PostValidationError) -> Self {
        Error::invalid_field(value.field(), value.code(), value.to_string())
    }
}

fn post_not_found(id: PostId) -> Error {
    Error::not_found(format!("post {id} not found"))
}

/// Post service backed by a [`PostRepository`].
#[derive(Clone)]
pub struct PostService<P> {
    repo: Arc<P>,
    clock: Arc<dyn Clock>,
    deadline: Deadline,
}

impl<P> PostService<P> {
    /// Build the service.
    pub fn new(repo: Arc<P>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            clock,
            deadline: Deadline::default(),
        }
    }

    /// Override the store deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }
}

impl<P> PostService<P>
where
    P: PostRepository,
{
    fn map_repo_error(error: PostPersistenceError, id: Option<PostId>) -> Error {
        match error {
            PostPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("post repository unavailable: {message}"))
            }
            PostPersistenceError::Query { message } => {
                Error::internal(format!("post repository error: {message}"))
            }
            PostPersistenceError::MissingPost => match id {
                Some(id) => post_not_found(id),
                None => Error::not_found("post not found"),
            },
        }
    }

    async fn owned_post(&self, caller: UserId, id: PostId) -> Result<Post, Error> {
        let post = self
            .deadline
            .bound("post.find_by_id", self.repo.find_by_id(id))
            .await
            .map_err(|err| Self::map_repo_error(err, Some(id)))?
            .ok_or_else(|| post_not_found(id))?;
        if post.author_id != caller {
            return Err(Error::forbidden("only the author may change this post")
                .with_code("not_post_author"));
        }
        Ok(post)
    }
}

#[async_trait]
impl<P> PostCommand for PostService<P>
where
    P: PostRepository,
{
    async fn create(&self, author: UserId, request: CreatePostRequest) -> Result<Post, Error> {
        let new_post = NewPost {
            author_id: author,
            title: Title::new(&request.title)?,
            content: Content::new(&request.content)?,
            tags: Tags::new(&request.tags)?,
            created_at: self.clock.utc(),
        };
        let post = self
            .deadline
            .bound("post.insert", self.repo.insert(&new_post))
            .await
            .map_err(|err| Self::map_repo_error(err, None))?;
        debug!(post_id = %post.id, author_id = %author, "post created");
        Ok(post)
    }

    async fn update(
        &self,
        caller: UserId,
        id: PostId,
        request: UpdatePostRequest,
    ) -> Result<Post, Error> {
        let title = request.title.as_deref().map(Title::new).transpose()?;
        let content = request.content.as_deref().map(Content::new).transpose()?;
        let changes = PostChanges::new(title, content)?;

        self.owned_post(caller, id).await?;
        let updated = self
            .deadline
            .bound(
                "post.update",
                self.repo.update(id, &changes, self.clock.utc()),
            )
            .await
            .map_err(|err| Self::map_repo_error(err, Some(id)))?
            .ok_or_else(|| post_not_found(id))?;
        debug!(post_id = %id, "post updated");
        Ok(updated)
    }

    async fn delete(&self, caller: UserId, id: PostId) -> Result<(), Error> {
        self.owned_post(caller, id).await?;
        let removed = self
            .deadline
            .bound("post.delete", self.repo.delete(id))
            .await
            .map_err(|err| Self::map_repo_error(err, Some(id)))?;
        if !removed {
            return Err(post_not_found(id));
        }
        debug!(post_id = %id, "post deleted");
        Ok(())
    }

    async fn comment(&self, caller: UserId, id: PostId, content: String) -> Result<Comment, Error> {
        let new_comment = NewComment {
            post_id: id,
            author_id: caller,
            content: CommentBody::new(&content)?,
            created_at: self.clock.utc(),
        };
        let comment = self
            .deadline
            .bound("post.insert_comment", self.repo.insert_comment(&new_comment))
            .await
            .map_err(|err| Self::map_repo_error(err, Some(id)))?;
        debug!(post_id = %id, comment_id = %comment.id, "comment added");
        Ok(comment)
    }

    async fn like(&self, caller: UserId, id: PostId) -> Result<(), Error> {
        self.deadline
            .bound("post.add_like", self.repo.add_like(id, caller))
            .await
            .map_err(|err| Self::map_repo_error(err, Some(id)))?;
        debug!(post_id = %id, user_id = %caller, "post liked");
        Ok(())
    }
}

#[async_trait]
impl<P> PostQuery for PostService<P>
where
    P: PostRepository,
{
    async fn get(&self, id: PostId) -> Result<PostThread, Error> {
        let post = self
            .deadline
            .bound("post.find_by_id", self.repo.find_by_id(id))
            .await
            .map_err(|err| Self::map_repo_error(err, Some(id)))?
            .ok_or_else(|| post_not_found(id))?;
        let comments = self
            .deadline
            .bound("post.comments_for", self.repo.comments_for(id))
            .await
            .map_err(|err| Self::map_repo_error(err, Some(id)))?;
        Ok(PostThread { post, comments })
    }
}
