//! Posts API handlers.
//!
//! ```text
//! POST   /api/v1/posts                 {"title","content","tags"}
//! GET    /api/v1/posts/{id}
//! PATCH  /api/v1/posts/{id}            {"title"?,"content"?}
//! DELETE /api/v1/posts/{id}
//! POST   /api/v1/posts/{id}/comments   {"content"}
//! POST   /api/v1/posts/{id}/likes
//! ```
//!
//! Mutations act as the bearer of the session token; updating or deleting
//! another user's post answers 403.

use actix_web::{HttpResponse, delete, get, patch, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{CreatePostRequest, UpdatePostRequest};
use crate::domain::{Comment, Error, Post, PostId, PostThread};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id};

const POST_ID: FieldName = FieldName::new("id");

/// Body for `POST /api/v1/posts`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostBody {
    #[schema(example = "Hello")]
    pub title: String,
    #[schema(example = "First post")]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<CreatePostBody> for CreatePostRequest {
    fn from(value: CreatePostBody) -> Self {
        Self {
            title: value.title,
            content: value.content,
            tags: value.tags,
        }
    }
}

/// Body for `PATCH /api/v1/posts/{id}`; at least one field must be set.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostBody {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl From<UpdatePostBody> for UpdatePostRequest {
    fn from(value: UpdatePostBody) -> Self {
        Self {
            title: value.title,
            content: value.content,
        }
    }
}

/// Body for `POST /api/v1/posts/{id}/comments`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentBodyRequest {
    #[schema(example = "Nice post")]
    pub content: String,
}

/// A post as returned to clients.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id.get(),
            author_id: post.author_id.get(),
            title: post.title.into(),
            content: post.content.into(),
            tags: post.tags.into(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// A comment as returned to clients.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id.get(),
            post_id: comment.post_id.get(),
            author_id: comment.author_id.get(),
            content: comment.content.into(),
            created_at: comment.created_at,
        }
    }
}

/// A post with its comments, oldest comment first.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostThreadResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    pub comments: Vec<CommentResponse>,
}

impl From<PostThread> for PostThreadResponse {
    fn from(thread: PostThread) -> Self {
        Self {
            post: thread.post.into(),
            comments: thread.comments.into_iter().map(CommentResponse::from).collect(),
        }
    }
}

/// Publish a post as the caller.
#[utoipa::path(
    post,
    path = "/api/v1/posts",
    request_body = CreatePostBody,
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 400, description = "Invalid title, content or tags", body = Error),
        (status = 401, description = "Missing or invalid token", body = Error)
    ),
    tags = ["posts"],
    operation_id = "createPost",
    security(("BearerToken" = []))
)]
#[post("/posts")]
pub async fn create_post(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    payload: web::Json<CreatePostBody>,
) -> ApiResult<HttpResponse> {
    let post = state
        .posts
        .create(caller.id(), payload.into_inner().into())
        .await?;
    Ok(HttpResponse::Created().json(PostResponse::from(post)))
}

/// Fetch a post and its comments.
#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}",
    params(("id" = i64, Path, description = "Post identifier")),
    responses(
        (status = 200, description = "Post with comments", body = PostThreadResponse),
        (status = 400, description = "Invalid identifier", body = Error),
        (status = 404, description = "Unknown post", body = Error)
    ),
    tags = ["posts"],
    operation_id = "getPost",
    security([])
)]
#[get("/posts/{id}")]
pub async fn get_post(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<PostThreadResponse>> {
    let id: PostId = parse_id(&path, POST_ID)?;
    let thread = state.posts_query.get(id).await?;
    Ok(web::Json(thread.into()))
}

/// Change the title or content of one of the caller's posts.
#[utoipa::path(
    patch,
    path = "/api/v1/posts/{id}",
    params(("id" = i64, Path, description = "Post identifier")),
    request_body = UpdatePostBody,
    responses(
        (status = 200, description = "Post updated", body = PostResponse),
        (status = 400, description = "Invalid or empty update", body = Error),
        (status = 401, description = "Missing or invalid token", body = Error),
        (status = 403, description = "Post belongs to another user", body = Error),
        (status = 404, description = "Unknown post", body = Error)
    ),
    tags = ["posts"],
    operation_id = "updatePost",
    security(("BearerToken" = []))
)]
#[patch("/posts/{id}")]
pub async fn update_post(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<String>,
    payload: web::Json<UpdatePostBody>,
) -> ApiResult<web::Json<PostResponse>> {
    let id: PostId = parse_id(&path, POST_ID)?;
    let post = state
        .posts
        .update(caller.id(), id, payload.into_inner().into())
        .await?;
    Ok(web::Json(post.into()))
}

/// Delete one of the caller's posts with its comments and likes.
#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}",
    params(("id" = i64, Path, description = "Post identifier")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 401, description = "Missing or invalid token", body = Error),
        (status = 403, description = "Post belongs to another user", body = Error),
        (status = 404, description = "Unknown post", body = Error)
    ),
    tags = ["posts"],
    operation_id = "deletePost",
    security(("BearerToken" = []))
)]
#[delete("/posts/{id}")]
pub async fn delete_post(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: PostId = parse_id(&path, POST_ID)?;
    state.posts.delete(caller.id(), id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Comment on any post.
#[utoipa::path(
    post,
    path = "/api/v1/posts/{id}/comments",
    params(("id" = i64, Path, description = "Post identifier")),
    request_body = CommentBodyRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Invalid comment", body = Error),
        (status = 401, description = "Missing or invalid token", body = Error),
        (status = 404, description = "Unknown post", body = Error)
    ),
    tags = ["posts"],
    operation_id = "commentOnPost",
    security(("BearerToken" = []))
)]
#[post("/posts/{id}/comments")]
pub async fn comment_on_post(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<String>,
    payload: web::Json<CommentBodyRequest>,
) -> ApiResult<HttpResponse> {
    let id: PostId = parse_id(&path, POST_ID)?;
    let comment = state
        .posts
        .comment(caller.id(), id, payload.into_inner().content)
        .await?;
    Ok(HttpResponse::Created().json(CommentResponse::from(comment)))
}

/// Like any post; repeat likes are ignored.
#[utoipa::path(
    post,
    path = "/api/v1/posts/{id}/likes",
    params(("id" = i64, Path, description = "Post identifier")),
    responses(
        (status = 204, description = "Post liked"),
        (status = 401, description = "Missing or invalid token", body = Error),
        (status = 404, description = "Unknown post", body = Error)
    ),
    tags = ["posts"],
    operation_id = "likePost",
    security(("BearerToken" = []))
)]
#[post("/posts/{id}/likes")]
pub async fn like_post(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: PostId = parse_id(&path, POST_ID)?;
    state.posts.like(caller.id(), id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests;
