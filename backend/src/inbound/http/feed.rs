//! Feed API handler.
//!
//! ```text
//! GET /api/v1/users/feed?limit=20&offset=0&sort=desc&search=rust&tags=a,b&since=..&until=..
//! ```
//!
//! Query parameters reach the domain as raw strings so that validation
//! failures surface through the feed engine with field-level details.

use actix_web::{HttpRequest, get, web};
use chrono::{DateTime, Utc};
use pagination::{PageRequest, Paginated};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, FeedEntry, RawFeedParams};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::state::HttpState;

/// One post in the caller's feed, joined with author and engagement counts.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntryResponse {
    #[schema(example = 12)]
    pub id: i64,
    #[schema(example = 1)]
    pub author_id: i64,
    #[schema(example = "ada")]
    pub author_username: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub comment_count: u64,
    pub like_count: u64,
}

impl From<FeedEntry> for FeedEntryResponse {
    fn from(entry: FeedEntry) -> Self {
        let FeedEntry {
            post,
            author_username,
            comment_count,
            like_count,
        } = entry;
        Self {
            id: post.id.get(),
            author_id: post.author_id.get(),
            author_username: author_username.to_string(),
            title: post.title.into(),
            content: post.content.into(),
            tags: post.tags.into(),
            created_at: post.created_at,
            updated_at: post.updated_at,
            comment_count,
            like_count,
        }
    }
}

/// Read the caller's feed: their own posts and posts by users they follow.
#[utoipa::path(
    get,
    path = "/api/v1/users/feed",
    params(
        ("limit" = Option<String>, Query, description = "Page size, clamped to the configured maximum"),
        ("offset" = Option<String>, Query, description = "Entries to skip"),
        ("sort" = Option<String>, Query, description = "`asc` or `desc` by creation time"),
        ("search" = Option<String>, Query, description = "Case-insensitive match on title or content"),
        ("tags" = Option<String>, Query, description = "Comma-separated tags; any match qualifies"),
        ("since" = Option<String>, Query, description = "RFC 3339 lower creation bound"),
        ("until" = Option<String>, Query, description = "RFC 3339 upper creation bound")
    ),
    responses(
        (status = 200, description = "Feed window", body = crate::inbound::http::schemas::FeedPageSchema),
        (status = 400, description = "Invalid query parameter", body = Error),
        (status = 401, description = "Missing or invalid token", body = Error),
        (status = 503, description = "Record store unavailable", body = Error)
    ),
    tags = ["users"],
    operation_id = "getFeed",
    security(("BearerToken" = []))
)]
#[get("/users/feed")]
pub async fn feed(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    params: web::Query<RawFeedParams>,
    req: HttpRequest,
) -> ApiResult<web::Json<Paginated<FeedEntryResponse>>> {
    let page = state.feed.feed(caller.id(), &params).await?;
    let window = PageRequest::new(page.query.limit(), page.query.offset())
        .map_err(|err| Error::internal(format!("feed window rejected: {err}")))?;
    let entries = page.entries.into_iter().map(FeedEntryResponse::from).collect();
    Ok(web::Json(Paginated::new(entries, window, &req.full_url())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::FeedPage;
    use crate::domain::{Content, FeedQuery, Post, PostId, Tags, Title, UserId, Username};
    use crate::inbound::http::test_utils::{TestPorts, bearer};
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use serde_json::Value;

    fn entry(id: i64) -> FeedEntry {
        let at = DateTime::<Utc>::from_timestamp(1_700_000_000 + id, 0).expect("timestamp");
        FeedEntry {
            post: Post {
                id: PostId::new(id),
                author_id: UserId::new(2),
                title: Title::new(format!("post {id}")).expect("title"),
                content: Content::new("body").expect("content"),
                tags: Tags::new(["rust"]).expect("tags"),
                created_at: at,
                updated_at: at,
            },
            author_username: Username::new("grace").expect("username"),
            comment_count: 3,
            like_count: 1,
        }
    }

    async fn get_feed(ports: TestPorts, uri: &str) -> (StatusCode, Value) {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(ports.into_state()))
                .service(web::scope("/api/v1").service(feed)),
        )
        .await;
        let request = actix_test::TestRequest::get()
            .uri(uri)
            .insert_header(bearer("session"))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        let status = response.status();
        (status, actix_test::read_body_json(response).await)
    }

    #[actix_web::test]
    async fn full_pages_link_forward_and_back() {
        let mut ports = TestPorts::signed_in_as(1);
        ports
            .feed
            .expect_feed()
            .withf(|viewer, raw| {
                *viewer == UserId::new(1)
                    && raw.limit.as_deref() == Some("2")
                    && raw.tags.as_deref() == Some("rust")
            })
            .returning(|_, raw| {
                Ok(FeedPage {
                    entries: vec![entry(3), entry(4)],
                    query: FeedQuery::parse(raw, 100).expect("query"),
                })
            });

        let (status, body) =
            get_feed(ports, "/api/v1/users/feed?limit=2&offset=2&tags=rust").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["limit"], 2);
        assert_eq!(body["offset"], 2);
        assert_eq!(body["data"][0]["authorUsername"], "grace");
        assert_eq!(body["data"][0]["commentCount"], 3);
        let next = body["links"]["next"].as_str().expect("next link");
        assert!(next.contains("offset=4"));
        assert!(next.contains("tags=rust"));
        let prev = body["links"]["prev"].as_str().expect("prev link");
        assert!(prev.contains("offset=0"));
    }

    #[actix_web::test]
    async fn short_first_pages_have_no_neighbours() {
        let mut ports = TestPorts::signed_in_as(1);
        ports.feed.expect_feed().returning(|_, raw| {
            Ok(FeedPage {
                entries: vec![entry(1)],
                query: FeedQuery::parse(raw, 100).expect("query"),
            })
        });

        let (status, body) = get_feed(ports, "/api/v1/users/feed").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["links"].get("next").is_none());
        assert!(body["links"].get("prev").is_none());
    }

    #[actix_web::test]
    async fn validation_failures_keep_field_details() {
        let mut ports = TestPorts::signed_in_as(1);
        ports.feed.expect_feed().returning(|_, _| {
            Err(Error::invalid_field("sort", "invalid_sort", "sort must be asc or desc"))
        });

        let (status, body) = get_feed(ports, "/api/v1/users/feed?sort=sideways").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["field"], "sort");
    }
}
