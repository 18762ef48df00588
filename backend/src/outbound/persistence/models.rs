//! Internal Diesel row structs for database operations.
//!
//! These types never leave the persistence layer. Conversions back into the
//! domain re-run the domain constructors, so a row that no longer satisfies
//! an invariant surfaces as a query error instead of a corrupt value.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{Array, BigInt, Text, Timestamptz, Varchar};

use crate::domain::{
    ActivationState, Comment, CommentBody, CommentId, Content, Email, FeedEntry, PasswordHash,
    Post, PostId, Tags, Title, User, UserId, UserRecord, Username,
};

use super::schema::{comments, followers, post_likes, posts, user_invitations, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = String;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let username = Username::new(&row.username)
            .map_err(|err| format!("stored username for user {}: {err}", row.id))?;
        let email = Email::new(&row.email)
            .map_err(|err| format!("stored email for user {}: {err}", row.id))?;
        Ok(Self::from(UserRecord {
            id: UserId::new(row.id),
            username,
            email,
            password_hash: PasswordHash::from_phc(row.password_hash),
            activation: ActivationState::from_active_flag(row.is_active),
            created_at: row.created_at,
        }))
    }
}

/// Insertable struct for creating user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub is_active: bool,
}

/// Insertable struct for invitation entries.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_invitations)]
pub(crate) struct NewInvitationRow<'a> {
    pub token_digest: &'a str,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

/// Row returned when an invitation is deleted.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = user_invitations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct InvitationRow {
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

/// Insertable struct for follow edges.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = followers)]
pub(crate) struct NewFollowRow {
    pub follower_id: i64,
    pub followed_id: i64,
}

/// Row struct for reading from the posts table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PostRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PostRow> for Post {
    type Error = String;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        let PostRow {
            id,
            user_id,
            title,
            content,
            tags,
            created_at,
            updated_at,
        } = row;
        Ok(Self {
            id: PostId::new(id),
            author_id: UserId::new(user_id),
            title: Title::new(&title).map_err(|err| format!("stored title for post {id}: {err}"))?,
            content: Content::new(&content)
                .map_err(|err| format!("stored content for post {id}: {err}"))?,
            tags: Tags::new(&tags).map_err(|err| format!("stored tags for post {id}: {err}"))?,
            created_at,
            updated_at,
        })
    }
}

/// Insertable struct for posts.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = posts)]
pub(crate) struct NewPostRow<'a> {
    pub user_id: i64,
    pub title: &'a str,
    pub content: &'a str,
    pub tags: &'a [String],
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update for posts; `None` leaves a column untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = posts)]
pub(crate) struct PostChangeset<'a> {
    pub title: Option<&'a str>,
    pub content: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

/// Row struct for reading from the comments table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CommentRow {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<CommentRow> for Comment {
    type Error = String;

    fn try_from(row: CommentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CommentId::new(row.id),
            post_id: PostId::new(row.post_id),
            author_id: UserId::new(row.user_id),
            content: CommentBody::new(&row.content)
                .map_err(|err| format!("stored comment {}: {err}", row.id))?,
            created_at: row.created_at,
        })
    }
}

/// Insertable struct for comments.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = comments)]
pub(crate) struct NewCommentRow<'a> {
    pub post_id: i64,
    pub user_id: i64,
    pub content: &'a str,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for likes.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = post_likes)]
pub(crate) struct NewLikeRow {
    pub post_id: i64,
    pub user_id: i64,
}

/// One row of the hand-written feed query.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct FeedRow {
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    #[diesel(sql_type = BigInt)]
    pub user_id: i64,
    #[diesel(sql_type = Varchar)]
    pub title: String,
    #[diesel(sql_type = Varchar)]
    pub content: String,
    #[diesel(sql_type = Array<Text>)]
    pub tags: Vec<String>,
    #[diesel(sql_type = Timestamptz)]
    pub created_at: DateTime<Utc>,
    #[diesel(sql_type = Timestamptz)]
    pub updated_at: DateTime<Utc>,
    #[diesel(sql_type = Varchar)]
    pub username: String,
    #[diesel(sql_type = BigInt)]
    pub comment_count: i64,
    #[diesel(sql_type = BigInt)]
    pub like_count: i64,
}

impl TryFrom<FeedRow> for FeedEntry {
    type Error = String;

    fn try_from(row: FeedRow) -> Result<Self, Self::Error> {
        let author_username = Username::new(&row.username)
            .map_err(|err| format!("stored username for user {}: {err}", row.user_id))?;
        let comment_count = u64::try_from(row.comment_count)
            .map_err(|_| format!("negative comment count for post {}", row.id))?;
        let like_count = u64::try_from(row.like_count)
            .map_err(|_| format!("negative like count for post {}", row.id))?;
        let post = Post::try_from(PostRow {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            content: row.content,
            tags: row.tags,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })?;
        Ok(Self {
            post,
            author_username,
            comment_count,
            like_count,
        })
    }
}
