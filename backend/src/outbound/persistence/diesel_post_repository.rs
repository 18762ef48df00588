//! PostgreSQL-backed [`PostRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{PostPersistenceError, PostRepository};
use crate::domain::{Comment, NewComment, NewPost, Post, PostChanges, PostId, UserId};

use super::diesel_error_mapping::{StoreFailure, convert_row, convert_rows, map_store_error};
use super::models::{CommentRow, NewCommentRow, NewLikeRow, NewPostRow, PostChangeset, PostRow};
use super::pool::DbPool;
use super::schema::{comments, post_likes, posts};

/// Diesel implementation of the post port.
#[derive(Clone)]
pub struct DieselPostRepository {
    pool: DbPool,
}

impl DieselPostRepository {
    /// Build the repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for DieselPostRepository {
    async fn insert(&self, post: &NewPost) -> Result<Post, PostPersistenceError> {
        let mut conn = self.pool.get().await.map_err(StoreFailure::from)?;
        let row = diesel::insert_into(posts::table)
            .values(&NewPostRow {
                user_id: post.author_id.get(),
                title: post.title.as_ref(),
                content: post.content.as_ref(),
                tags: post.tags.as_slice(),
                created_at: post.created_at,
                updated_at: post.created_at,
            })
            .returning(PostRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(StoreFailure::from)?;
        convert_row(row)
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, PostPersistenceError> {
        let mut conn = self.pool.get().await.map_err(StoreFailure::from)?;
        let row = posts::table
            .find(id.get())
            .select(PostRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(StoreFailure::from)?;
        row.map(convert_row).transpose()
    }

    async fn update(
        &self,
        id: PostId,
        changes: &PostChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Post>, PostPersistenceError> {
        let mut conn = self.pool.get().await.map_err(StoreFailure::from)?;
        let row = diesel::update(posts::table.find(id.get()))
            .set(&PostChangeset {
                title: changes.title().map(AsRef::as_ref),
                content: changes.content().map(AsRef::as_ref),
                updated_at,
            })
            .returning(PostRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(StoreFailure::from)?;
        row.map(convert_row).transpose()
    }

    async fn delete(&self, id: PostId) -> Result<bool, PostPersistenceError> {
        let mut conn = self.pool.get().await.map_err(StoreFailure::from)?;
        let removed = diesel::delete(posts::table.find(id.get()))
            .execute(&mut conn)
            .await
            .map_err(StoreFailure::from)?;
        Ok(removed > 0)
    }

    async fn insert_comment(&self, comment: &NewComment) -> Result<Comment, PostPersistenceError> {
        let mut conn = self.pool.get().await.map_err(StoreFailure::from)?;
        let row = diesel::insert_into(comments::table)
            .values(&NewCommentRow {
                post_id: comment.post_id.get(),
                user_id: comment.author_id.get(),
                content: comment.content.as_ref(),
                created_at: comment.created_at,
            })
            .returning(CommentRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(StoreFailure::from)?;
        convert_row(row)
    }

    async fn comments_for(&self, id: PostId) -> Result<Vec<Comment>, PostPersistenceError> {
        let mut conn = self.pool.get().await.map_err(StoreFailure::from)?;
        let rows: Vec<CommentRow> = comments::table
            .filter(comments::post_id.eq(id.get()))
            .select(CommentRow::as_select())
            .order_by((comments::created_at.asc(), comments::id.asc()))
            .load(&mut conn)
            .await
            .map_err(StoreFailure::from)?;
        convert_rows(rows)
    }

    async fn add_like(&self, id: PostId, user: UserId) -> Result<(), PostPersistenceError> {
        let mut conn = self.pool.get().await.map_err(StoreFailure::from)?;
        diesel::insert_into(post_likes::table)
            .values(&NewLikeRow {
                post_id: id.get(),
                user_id: user.get(),
            })
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_store_error)
    }
}
