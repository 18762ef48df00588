//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! document for the REST API. It registers:
//!
//! - **Paths**: every HTTP endpoint from the inbound layer (users, auth,
//!   posts, health)
//! - **Schemas**: request and response DTOs plus the domain error envelope
//! - **Security**: bearer session token authentication scheme
//!
//! The generated document is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::feed::FeedEntryResponse;
use crate::inbound::http::posts::{
    CommentBodyRequest, CommentResponse, CreatePostBody, PostResponse, PostThreadResponse,
    UpdatePostBody,
};
use crate::inbound::http::schemas::{FeedPageSchema, PaginationLinksSchema};
use crate::inbound::http::tokens::{TokenRequest, TokenResponse};
use crate::inbound::http::users::{
    AccountResponse, RegisterRequest, RegistrationResponse, ResendActivationRequest, UserResponse,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Name of the bearer security scheme referenced by protected handlers.
pub const BEARER_SCHEME: &str = "BearerToken";

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            BEARER_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Session token issued by POST /api/v1/auth/token."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Social backend API",
        description = "HTTP interface for registration, the follower graph, posts and the personalised feed.",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0.html"
        )
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerToken" = [])),
    paths(
        crate::inbound::http::users::register,
        crate::inbound::http::users::activate,
        crate::inbound::http::users::resend_activation,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::follow,
        crate::inbound::http::users::unfollow,
        crate::inbound::http::feed::feed,
        crate::inbound::http::tokens::issue_token,
        crate::inbound::http::posts::create_post,
        crate::inbound::http::posts::get_post,
        crate::inbound::http::posts::update_post,
        crate::inbound::http::posts::delete_post,
        crate::inbound::http::posts::comment_on_post,
        crate::inbound::http::posts::like_post,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        RegisterRequest,
        AccountResponse,
        UserResponse,
        RegistrationResponse,
        ResendActivationRequest,
        TokenRequest,
        TokenResponse,
        CreatePostBody,
        UpdatePostBody,
        CommentBodyRequest,
        PostResponse,
        CommentResponse,
        PostThreadResponse,
        FeedEntryResponse,
        FeedPageSchema,
        PaginationLinksSchema,
    )),
    tags(
        (name = "users", description = "Registration, activation, profiles and the follower graph"),
        (name = "auth", description = "Session token issuance"),
        (name = "posts", description = "Posts, comments and likes"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the generated OpenAPI document.

    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    /// Assert that an Object schema contains a field with the given name.
    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    fn schema(name: &str) -> RefOr<Schema> {
        let doc = ApiDoc::openapi();
        let schemas = doc.components.expect("components").schemas;
        schemas
            .get(name)
            .cloned()
            .unwrap_or_else(|| panic!("{name} schema should be registered"))
    }

    #[rstest]
    #[case::error("Error", "code")]
    #[case::error_message("Error", "message")]
    #[case::registration("RegistrationResponse", "token")]
    #[case::account("AccountResponse", "isActive")]
    #[case::feed_entry("FeedEntryResponse", "authorUsername")]
    #[case::feed_page("FeedPage", "links")]
    #[case::links("PaginationLinks", "self")]
    fn schemas_expose_their_fields(#[case] name: &str, #[case] field: &str) {
        assert_object_schema_has_field(&schema(name), field);
    }

    #[test]
    fn public_profiles_do_not_document_email() {
        match schema("UserResponse") {
            RefOr::T(Schema::Object(obj)) => assert!(!obj.properties.contains_key("email")),
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    #[case("/api/v1/users")]
    #[case("/api/v1/users/activate/{token}")]
    #[case("/api/v1/users/activation/resend")]
    #[case("/api/v1/users/{id}")]
    #[case("/api/v1/users/{id}/follow")]
    #[case("/api/v1/users/feed")]
    #[case("/api/v1/auth/token")]
    #[case("/api/v1/posts")]
    #[case("/api/v1/posts/{id}")]
    #[case("/api/v1/posts/{id}/comments")]
    #[case("/api/v1/posts/{id}/likes")]
    #[case("/health/ready")]
    #[case("/health/live")]
    fn every_route_is_documented(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(
            doc.paths.paths.contains_key(path),
            "path {path} should be documented"
        );
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key(BEARER_SCHEME));
    }
}
