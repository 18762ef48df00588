//! Session token endpoint.
//!
//! ```text
//! POST /api/v1/auth/token {"email":"ada@example.com","password":"..."}
//! ```

use actix_web::{HttpResponse, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use zeroize::Zeroizing;

use crate::domain::{Error, LoginCredentials};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::login_validation_error;

/// Credentials exchanged for a session token.
#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub password: String,
}

/// A signed bearer token and the instant it stops verifying.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Authenticate with email and password.
///
/// Unknown emails, wrong passwords and pending accounts all answer 401 with
/// the same message.
#[utoipa::path(
    post,
    path = "/api/v1/auth/token",
    request_body = TokenRequest,
    responses(
        (status = 201, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Missing email or password", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 503, description = "Record store unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "issueToken",
    security([])
)]
#[post("/auth/token")]
pub async fn issue_token(
    state: web::Data<HttpState>,
    payload: web::Json<TokenRequest>,
) -> ApiResult<HttpResponse> {
    let TokenRequest { email, password } = payload.into_inner();
    let secret = Zeroizing::new(password);
    let credentials = LoginCredentials::try_from_parts(&email, secret.as_str())
        .map_err(|err| login_validation_error(&err))?;
    let issued = state.tokens.issue(&credentials).await?;
    info!("session token issued");
    Ok(HttpResponse::Created().json(TokenResponse {
        token: issued.token.as_str().to_owned(),
        expires_at: issued.expires_at,
    }))
}
