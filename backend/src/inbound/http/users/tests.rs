//! Tests for users API handlers.

use super::*;
use crate::inbound::http::test_utils::{TestPorts, bearer, sample_user};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use mockall::predicate::eq;
use rstest::rstest;
use serde_json::{Value, json};

async fn call(ports: TestPorts, request: actix_test::TestRequest) -> (StatusCode, Value) {
    let app = actix_test::init_service(
        App::new()
            .app_data(web::Data::new(ports.into_state()))
            .service(
                web::scope("/api/v1")
                    .service(register)
                    .service(activate)
                    .service(resend_activation)
                    .service(get_user)
                    .service(follow)
                    .service(unfollow),
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
async fn register_returns_account_and_token() {
    let mut ports = TestPorts::default();
    ports
        .registration
        .expect_register()
        .withf(|req| req.username == "ada" && req.password.as_str() == "correct horse")
        .times(1)
        .returning(|req| {
            Ok(Registration {
                user: sample_user(7, &req.username),
                token: InvitationToken::from_presented("activation-token"),
            })
        });

    let (status, body) = call(
        ports,
        actix_test::TestRequest::post().uri("/api/v1/users").set_json(json!({
            "username": "ada",
            "email": "ada@example.com",
            "password": "correct horse"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["token"], "activation-token");
    assert_eq!(body["user"]["id"], 7);
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["isActive"], false);
    assert!(body["user"].get("password").is_none());
}

#[actix_web::test]
async fn register_surfaces_conflicts() {
    let mut ports = TestPorts::default();
    ports.registration.expect_register().returning(|_| {
        Err(Error::conflict("email already registered").with_code("duplicate_email"))
    });

    let (status, body) = call(
        ports,
        actix_test::TestRequest::post().uri("/api/v1/users").set_json(json!({
            "username": "ada",
            "email": "ada@example.com",
            "password": "pw"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");
    assert_eq!(body["details"]["code"], "duplicate_email");
}

#[actix_web::test]
async fn resend_activation_is_accepted_without_a_body() {
    let mut ports = TestPorts::default();
    ports
        .registration
        .expect_resend_invitation()
        .with(eq("ada@example.com"))
        .times(1)
        .returning(|_| Ok(()));

    let (status, body) = call(
        ports,
        actix_test::TestRequest::post()
            .uri("/api/v1/users/activation/resend")
            .set_json(json!({ "email": "ada@example.com" })),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body, Value::Null);
}

#[actix_web::test]
async fn resend_activation_surfaces_invalid_emails() {
    let mut ports = TestPorts::default();
    ports.registration.expect_resend_invitation().returning(|_| {
        Err(Error::invalid_field("email", "invalid_email", "email is not valid"))
    });

    let (status, body) = call(
        ports,
        actix_test::TestRequest::post()
            .uri("/api/v1/users/activation/resend")
            .set_json(json!({ "email": "nope" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["code"], "invalid_email");
}

#[actix_web::test]
async fn activate_passes_the_presented_token() {
    let mut ports = TestPorts::default();
    ports
        .activation
        .expect_activate()
        .withf(|token| token.expose() == "abc123")
        .times(1)
        .returning(|_| Ok(sample_user(3, "grace").activated()));

    let (status, body) = call(
        ports,
        actix_test::TestRequest::put().uri("/api/v1/users/activate/abc123"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "grace");
    assert_eq!(body["isActive"], true);
}

#[actix_web::test]
async fn get_user_hides_the_email() {
    let mut ports = TestPorts::default();
    ports
        .users
        .expect_fetch_user()
        .with(eq(UserId::new(5)))
        .returning(|_| Ok(sample_user(5, "linus")));

    let (status, body) = call(ports, actix_test::TestRequest::get().uri("/api/v1/users/5")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "linus");
    assert!(body.get("email").is_none());
}

#[rstest]
#[case::word("abc")]
#[case::zero("0")]
#[case::negative("-4")]
#[actix_web::test]
async fn malformed_ids_are_rejected_before_the_port(#[case] raw: &str) {
    let (status, body) = call(
        TestPorts::default(),
        actix_test::TestRequest::get().uri(&format!("/api/v1/users/{raw}")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["code"], "invalid_id");
    assert_eq!(body["details"]["field"], "id");
}

#[actix_web::test]
async fn follow_acts_as_the_token_holder() {
    let mut ports = TestPorts::signed_in_as(1);
    ports
        .follows
        .expect_follow()
        .with(eq(UserId::new(1)), eq(UserId::new(2)))
        .times(1)
        .returning(|_, _| Ok(()));

    let (status, _) = call(
        ports,
        actix_test::TestRequest::put()
            .uri("/api/v1/users/2/follow")
            .insert_header(bearer("session")),
    )
    .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn follow_requires_a_token() {
    let (status, body) = call(
        TestPorts::default(),
        actix_test::TestRequest::put().uri("/api/v1/users/2/follow"),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["details"]["code"], "missing_token");
}

#[actix_web::test]
async fn self_follow_is_a_bad_request() {
    let mut ports = TestPorts::signed_in_as(4);
    ports.follows.expect_follow().returning(|_, _| {
        Err(Error::invalid_request("cannot follow yourself").with_code("self_follow"))
    });

    let (status, body) = call(
        ports,
        actix_test::TestRequest::put()
            .uri("/api/v1/users/4/follow")
            .insert_header(bearer("session")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["code"], "self_follow");
}

#[actix_web::test]
async fn unfollow_returns_no_content() {
    let mut ports = TestPorts::signed_in_as(1);
    ports
        .follows
        .expect_unfollow()
        .with(eq(UserId::new(1)), eq(UserId::new(9)))
        .times(1)
        .returning(|_, _| Ok(()));

    let (status, _) = call(
        ports,
        actix_test::TestRequest::delete()
            .uri("/api/v1/users/9/follow")
            .insert_header(bearer("session")),
    )
    .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
}
