//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::AppSettings;
pub(crate) use state_builders::build_state;

use std::net::SocketAddr;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use social_backend::Trace;
#[cfg(debug_assertions)]
use social_backend::doc::ApiDoc;
use social_backend::inbound::http::feed::feed;
use social_backend::inbound::http::health::{HealthState, live, ready};
use social_backend::inbound::http::posts::{
    comment_on_post, create_post, delete_post, get_post, like_post, update_post,
};
use social_backend::inbound::http::state::HttpState;
use social_backend::inbound::http::tokens::issue_token;
use social_backend::inbound::http::users::{
    activate, follow, get_user, register, resend_activation, unfollow,
};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    // `/users/feed` must be registered ahead of `/users/{id}`.
    let api = web::scope("/api/v1")
        .service(register)
        .service(activate)
        .service(resend_activation)
        .service(feed)
        .service(get_user)
        .service(follow)
        .service(unfollow)
        .service(issue_token)
        .service(create_post)
        .service(get_post)
        .service(update_post)
        .service(delete_post)
        .service(comment_on_post)
        .service(like_post);

    App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live)
        .configure(mount_docs)
}

/// Serve Swagger UI in debug builds.
#[cfg_attr(
    not(debug_assertions),
    expect(unused_variables, reason = "docs are only mounted in debug builds")
)]
fn mount_docs(cfg: &mut web::ServiceConfig) {
    #[cfg(debug_assertions)]
    cfg.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
}

/// Construct an Actix HTTP server over the built ports.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    http_state: HttpState,
    bind_addr: SocketAddr,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let shared_state = web::Data::new(http_state);

    let server = HttpServer::new(move || {
        build_app(server_health_state.clone(), shared_state.clone())
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}

#[cfg(test)]
mod tests {
    //! Tests for route wiring and readiness signalling.

    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use social_backend::outbound::memory::InMemoryStore;
    use std::sync::Arc;

    async fn memory_state() -> HttpState {
        let settings = AppSettings {
            bind_addr: None,
            database_url: None,
            frontend_url: None,
            environment: None,
            token_secret: Some("a-test-secret-that-is-long-enough!".to_owned()),
            token_issuer: None,
            token_ttl_secs: None,
            invitation_ttl_secs: None,
            mail_api_key: None,
            mail_api_url: None,
            mail_from_address: None,
            mail_from_name: None,
            feed_max_limit: None,
            store_timeout_ms: None,
            argon2_memory_kib: Some(8),
            argon2_iterations: Some(1),
            argon2_parallelism: Some(1),
        };
        build_state(&settings).await.expect("state").http
    }

    #[actix_web::test]
    async fn create_server_marks_ready() {
        let health_state = web::Data::new(HealthState::new());
        assert!(!health_state.is_ready(), "state should start unready");

        let _server = create_server(
            health_state.clone(),
            memory_state().await,
            "127.0.0.1:0".parse().expect("socket address"),
        )
        .expect("server should bind");

        assert!(health_state.is_ready(), "server creation should mark readiness");
    }

    #[rstest]
    #[case::feed_before_profile("/api/v1/users/feed", StatusCode::UNAUTHORIZED)]
    #[case::profile("/api/v1/users/1", StatusCode::NOT_FOUND)]
    #[case::unknown_post("/api/v1/posts/1", StatusCode::NOT_FOUND)]
    #[case::bad_id("/api/v1/posts/x", StatusCode::BAD_REQUEST)]
    #[actix_web::test]
    async fn routes_resolve_in_order(#[case] uri: &str, #[case] expected: StatusCode) {
        let health = HealthState::new().with_store_probe(Arc::new(InMemoryStore::default()));
        let app = actix_test::init_service(build_app(
            web::Data::new(health),
            web::Data::new(memory_state().await),
        ))
        .await;

        let response =
            actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request())
                .await;
        assert_eq!(response.status(), expected);
        assert!(response.headers().contains_key("trace-id"));
    }
}
