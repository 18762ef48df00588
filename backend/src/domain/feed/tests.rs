//! Feed parameter validation and engine behaviour.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rstest::rstest;

use super::*;
use crate::domain::ports::{FeedPersistenceError, FeedQueryService, MockFeedRepository};
use crate::domain::{
    Content, Error, ErrorCode, Post, PostId, Tags, Title, UserId, Username,
};

fn raw(pairs: &[(&str, &str)]) -> RawFeedParams {
    let mut params = RawFeedParams::default();
    for (key, value) in pairs {
        let value = Some((*value).to_owned());
        match *key {
            "limit" => params.limit = value,
            "offset" => params.offset = value,
            "sort" => params.sort = value,
            "search" => params.search = value,
            "tags" => params.tags = value,
            "since" => params.since = value,
            "until" => params.until = value,
            other => panic!("unknown feed parameter {other}"),
        }
    }
    params
}

fn at(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds, 0).single().expect("valid timestamp")
}

fn post(id: i64, title: &str, content: &str, tags: &[&str], created: i64) -> Post {
    Post {
        id: PostId::new(id),
        author_id: UserId::new(1),
        title: Title::new(title).expect("title"),
        content: Content::new(content).expect("content"),
        tags: Tags::new(tags).expect("tags"),
        created_at: at(created),
        updated_at: at(created),
    }
}

#[rstest]
fn defaults_apply_when_nothing_is_given() {
    let query = FeedQuery::parse(&RawFeedParams::default(), DEFAULT_FEED_MAX_LIMIT).expect("valid");
    assert_eq!(query.limit(), DEFAULT_FEED_LIMIT);
    assert_eq!(query.offset(), 0);
    assert_eq!(query.sort(), SortDirection::Desc);
    assert_eq!(query.search(), None);
    assert!(query.tags().is_empty());
}

#[rstest]
#[case("1", 1)]
#[case("100", 100)]
#[case("101", 100)]
#[case("99999999999", 100)]
fn limit_is_clamped(#[case] limit: &str, #[case] expected: u32) {
    let query = FeedQuery::parse(&raw(&[("limit", limit)]), 100).expect("valid");
    assert_eq!(query.limit(), expected);
}

#[rstest]
#[case(&[("limit", "0")], FeedValidationError::InvalidLimit)]
#[case(&[("limit", "-5")], FeedValidationError::InvalidLimit)]
#[case(&[("limit", "ten")], FeedValidationError::InvalidLimit)]
#[case(&[("offset", "-1")], FeedValidationError::InvalidOffset)]
#[case(&[("offset", "1.5")], FeedValidationError::InvalidOffset)]
#[case(&[("offset", "9223372036854775808")], FeedValidationError::InvalidOffset)]
#[case(&[("sort", "newest")], FeedValidationError::InvalidSort)]
#[case(&[("since", "yesterday")], FeedValidationError::InvalidTimestamp { field: "since" })]
#[case(
    &[("since", "2024-02-01T00:00:00Z"), ("until", "2024-01-01T00:00:00Z")],
    FeedValidationError::InvertedRange
)]
fn invalid_parameters_are_rejected(
    #[case] pairs: &[(&str, &str)],
    #[case] expected: FeedValidationError,
) {
    assert_eq!(FeedQuery::parse(&raw(pairs), 100), Err(expected));
}

#[rstest]
fn largest_bindable_offset_is_accepted() {
    let query = FeedQuery::parse(&raw(&[("offset", "9223372036854775807")]), 100).expect("valid");
    assert_eq!(query.offset(), 9_223_372_036_854_775_807);
}

#[rstest]
#[case("ASC", SortDirection::Asc)]
#[case("desc", SortDirection::Desc)]
#[case("Desc", SortDirection::Desc)]
fn sort_is_case_insensitive(#[case] sort: &str, #[case] expected: SortDirection) {
    let query = FeedQuery::parse(&raw(&[("sort", sort)]), 100).expect("valid");
    assert_eq!(query.sort(), expected);
}

#[rstest]
fn search_is_bounded() {
    let long = "s".repeat(SEARCH_MAX + 1);
    assert_eq!(
        FeedQuery::parse(&raw(&[("search", long.as_str())]), 100),
        Err(FeedValidationError::SearchTooLong { max: SEARCH_MAX })
    );
}

#[rstest]
fn tag_list_is_bounded() {
    let tags = (0..=FEED_TAGS_MAX)
        .map(|i| format!("t{i}"))
        .collect::<Vec<_>>()
        .join(",");
    assert_eq!(
        FeedQuery::parse(&raw(&[("tags", tags.as_str())]), 100),
        Err(FeedValidationError::TooManyTags { max: FEED_TAGS_MAX })
    );
}

#[rstest]
#[case(&[("search", "RUST")], true)]
#[case(&[("search", "borrow")], true)]
#[case(&[("search", "python")], false)]
#[case(&[("tags", "tokio,serde")], true)]
#[case(&[("tags", "django")], false)]
#[case(&[("since", "1970-01-01T00:16:40Z")], true)]
#[case(&[("since", "1970-01-01T00:16:41Z")], false)]
#[case(&[("until", "1970-01-01T00:16:40Z")], true)]
#[case(&[("search", "rust"), ("tags", "django")], false)]
fn content_predicates(#[case] pairs: &[(&str, &str)], #[case] expected: bool) {
    let query = FeedQuery::parse(&raw(pairs), 100).expect("valid");
    let candidate = post(1, "Rust tips", "the borrow checker", &["tokio"], 1_000);
    assert_eq!(query.matches(&candidate), expected);
}

#[rstest]
#[tokio::test]
async fn invalid_parameters_never_reach_the_store() {
    let mut repo = MockFeedRepository::new();
    repo.expect_query_feed().never();
    let engine = FeedEngine::new(Arc::new(repo));

    let err = FeedQueryService::feed(&engine, UserId::new(1), &raw(&[("limit", "0")]))
        .await
        .expect_err("invalid limit");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(
        err.details().and_then(|d| d["field"].as_str()),
        Some("limit")
    );
}

#[rstest]
#[tokio::test]
async fn engine_passes_the_validated_query_through() {
    let mut repo = MockFeedRepository::new();
    repo.expect_query_feed()
        .withf(|viewer, query| {
            *viewer == UserId::new(7) && query.limit() == 5 && query.sort() == SortDirection::Asc
        })
        .times(1)
        .return_once(|_, _| {
            Ok(vec![FeedEntry {
                post: post(3, "hello", "world", &[], 10),
                author_username: Username::new("ada").expect("username"),
                comment_count: 2,
                like_count: 1,
            }])
        });
    let engine = FeedEngine::new(Arc::new(repo)).with_max_limit(5);

    let page = engine
        .get_feed(UserId::new(7), &raw(&[("limit", "50"), ("sort", "asc")]))
        .await
        .expect("feed page");
    assert_eq!(page.entries.len(), 1);
    assert_eq!(page.query.limit(), 5);
}

#[rstest]
#[case(FeedPersistenceError::connection("refused"), ErrorCode::ServiceUnavailable)]
#[case(FeedPersistenceError::query("bad"), ErrorCode::InternalError)]
#[tokio::test]
async fn store_failures_map_to_codes(
    #[case] failure: FeedPersistenceError,
    #[case] code: ErrorCode,
) {
    let mut repo = MockFeedRepository::new();
    repo.expect_query_feed().return_once(move |_, _| Err(failure));

    let err = FeedEngine::new(Arc::new(repo))
        .get_feed(UserId::new(1), &RawFeedParams::default())
        .await
        .expect_err("store failure");
    assert_eq!(Error::from(err).code(), code);
}
