//! Tests for posts API handlers.

use super::*;
use crate::domain::{CommentBody, CommentId, Content, Tags, Title, UserId};
use crate::inbound::http::test_utils::{TestPorts, bearer};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test};
use mockall::predicate::eq;
use serde_json::{Value, json};

fn at(offset: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_700_000_000 + offset, 0).expect("timestamp")
}

fn sample_post(id: i64, author: i64) -> Post {
    Post {
        id: PostId::new(id),
        author_id: UserId::new(author),
        title: Title::new("Hello").expect("title"),
        content: Content::new("First post").expect("content"),
        tags: Tags::new(["intro"]).expect("tags"),
        created_at: at(0),
        updated_at: at(0),
    }
}

fn sample_comment(id: i64, post: i64, author: i64) -> Comment {
    Comment {
        id: CommentId::new(id),
        post_id: PostId::new(post),
        author_id: UserId::new(author),
        content: CommentBody::new("Nice").expect("comment"),
        created_at: at(id),
    }
}

async fn call(ports: TestPorts, request: actix_test::TestRequest) -> (StatusCode, Value) {
    let app = actix_test::init_service(
        App::new()
            .app_data(web::Data::new(ports.into_state()))
            .service(
                web::scope("/api/v1")
                    .service(create_post)
                    .service(get_post)
                    .service(update_post)
                    .service(delete_post)
                    .service(comment_on_post)
                    .service(like_post),
            ),
    )
    .await;
    let response = actix_test::call_service(&app, request.to_request()).await;
    let status = response.status();
    let body = actix_test::read_body(response).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("json body")
    };
    (status, value)
}

#[actix_web::test]
async fn create_publishes_as_the_caller() {
    let mut ports = TestPorts::signed_in_as(1);
    ports
        .posts
        .expect_create()
        .withf(|author, req| {
            *author == UserId::new(1) && req.title == "Hello" && req.tags == ["intro"]
        })
        .times(1)
        .returning(|_, _| Ok(sample_post(10, 1)));

    let (status, body) = call(
        ports,
        actix_test::TestRequest::post()
            .uri("/api/v1/posts")
            .insert_header(bearer("session"))
            .set_json(json!({ "title": "Hello", "content": "First post", "tags": ["intro"] })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 10);
    assert_eq!(body["authorId"], 1);
    assert_eq!(body["tags"], json!(["intro"]));
}

#[actix_web::test]
async fn tags_default_to_empty() {
    let mut ports = TestPorts::signed_in_as(1);
    ports
        .posts
        .expect_create()
        .withf(|_, req| req.tags.is_empty())
        .returning(|_, _| Ok(sample_post(11, 1)));

    let (status, _) = call(
        ports,
        actix_test::TestRequest::post()
            .uri("/api/v1/posts")
            .insert_header(bearer("session"))
            .set_json(json!({ "title": "Hello", "content": "First post" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
}

#[actix_web::test]
async fn get_returns_the_thread_without_a_token() {
    let mut ports = TestPorts::default();
    ports
        .posts_query
        .expect_get()
        .with(eq(PostId::new(10)))
        .returning(|_| {
            Ok(PostThread {
                post: sample_post(10, 1),
                comments: vec![sample_comment(1, 10, 2), sample_comment(2, 10, 3)],
            })
        });

    let (status, body) = call(ports, actix_test::TestRequest::get().uri("/api/v1/posts/10")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Hello");
    assert_eq!(body["comments"][1]["authorId"], 3);
    assert_eq!(body["comments"][0]["postId"], 10);
}

#[actix_web::test]
async fn updating_anothers_post_is_forbidden() {
    let mut ports = TestPorts::signed_in_as(2);
    ports
        .posts
        .expect_update()
        .withf(|caller, id, req| {
            *caller == UserId::new(2)
                && *id == PostId::new(10)
                && req.title.as_deref() == Some("Mine now")
                && req.content.is_none()
        })
        .returning(|_, _, _| Err(Error::forbidden("only the author may change this post")));

    let (status, body) = call(
        ports,
        actix_test::TestRequest::patch()
            .uri("/api/v1/posts/10")
            .insert_header(bearer("session"))
            .set_json(json!({ "title": "Mine now" })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");
}

#[actix_web::test]
async fn delete_returns_no_content() {
    let mut ports = TestPorts::signed_in_as(1);
    ports
        .posts
        .expect_delete()
        .with(eq(UserId::new(1)), eq(PostId::new(10)))
        .times(1)
        .returning(|_, _| Ok(()));

    let (status, _) = call(
        ports,
        actix_test::TestRequest::delete()
            .uri("/api/v1/posts/10")
            .insert_header(bearer("session")),
    )
    .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn comments_are_created_for_the_caller() {
    let mut ports = TestPorts::signed_in_as(2);
    ports
        .posts
        .expect_comment()
        .withf(|caller, id, content| {
            *caller == UserId::new(2) && *id == PostId::new(10) && content == "Nice"
        })
        .returning(|_, _, _| Ok(sample_comment(5, 10, 2)));

    let (status, body) = call(
        ports,
        actix_test::TestRequest::post()
            .uri("/api/v1/posts/10/comments")
            .insert_header(bearer("session"))
            .set_json(json!({ "content": "Nice" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 5);
    assert_eq!(body["content"], "Nice");
}

#[actix_web::test]
async fn likes_on_missing_posts_are_not_found() {
    let mut ports = TestPorts::signed_in_as(2);
    ports
        .posts
        .expect_like()
        .returning(|_, _| Err(Error::not_found("post 99 not found")));

    let (status, body) = call(
        ports,
        actix_test::TestRequest::post()
            .uri("/api/v1/posts/99/likes")
            .insert_header(bearer("session")),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "post 99 not found");
}

#[actix_web::test]
async fn likes_return_no_content() {
    let mut ports = TestPorts::signed_in_as(2);
    ports
        .posts
        .expect_like()
        .with(eq(UserId::new(2)), eq(PostId::new(10)))
        .times(1)
        .returning(|_, _| Ok(()));

    let (status, _) = call(
        ports,
        actix_test::TestRequest::post()
            .uri("/api/v1/posts/10/likes")
            .insert_header(bearer("session")),
    )
    .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn mutations_need_a_token() {
    let (status, _) = call(
        TestPorts::default(),
        actix_test::TestRequest::delete().uri("/api/v1/posts/10"),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
