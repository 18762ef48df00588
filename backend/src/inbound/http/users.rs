//! Users API handlers.
//!
//! ```text
//! POST   /api/v1/users                    {"username","email","password"}
//! PUT    /api/v1/users/activate/{token}
//! POST   /api/v1/users/activation/resend  {"email"}
//! GET    /api/v1/users/{id}
//! PUT    /api/v1/users/{id}/follow
//! DELETE /api/v1/users/{id}/follow
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use zeroize::Zeroizing;

use crate::domain::ports::{Registration, RegistrationRequest};
use crate::domain::{Error, InvitationToken, User, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id};

const USER_ID: FieldName = FieldName::new("id");

/// Registration request body for `POST /api/v1/users`.
///
/// Example JSON:
/// `{"username":"ada","email":"ada@example.com","password":"correct horse"}`
#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl From<RegisterRequest> for RegistrationRequest {
    fn from(value: RegisterRequest) -> Self {
        Self {
            username: value.username,
            email: value.email,
            password: Zeroizing::new(value.password),
        }
    }
}

/// Account view returned to the account owner.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "ada")]
    pub username: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for AccountResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().get(),
            username: user.username().to_string(),
            email: user.email().to_string(),
            is_active: user.activation().is_active(),
            created_at: user.created_at(),
        }
    }
}

/// Public profile returned to any caller.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "ada")]
    pub username: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().get(),
            username: user.username().to_string(),
            is_active: user.activation().is_active(),
            created_at: user.created_at(),
        }
    }
}

/// Response body for a successful registration.
///
/// `token` is the one-time activation token; it is also delivered by mail and
/// is never retrievable again.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub user: AccountResponse,
    pub token: String,
}

impl From<&Registration> for RegistrationResponse {
    fn from(value: &Registration) -> Self {
        Self {
            user: AccountResponse::from(&value.user),
            token: value.token.expose().to_owned(),
        }
    }
}

/// Register a pending account and send its activation mail.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegistrationResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Username or email already registered", body = Error),
        (status = 500, description = "Internal server error", body = Error),
        (status = 503, description = "Record store unavailable", body = Error)
    ),
    tags = ["users"],
    operation_id = "registerUser",
    security([])
)]
#[post("/users")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let registration = state
        .registration
        .register(payload.into_inner().into())
        .await?;
    Ok(HttpResponse::Created().json(RegistrationResponse::from(&registration)))
}

/// Request body for `POST /api/v1/users/activation/resend`.
///
/// Example JSON: `{"email":"ada@example.com"}`
#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResendActivationRequest {
    pub email: String,
}

/// Mail a fresh activation link to a pending account.
///
/// The response is the same whether or not a pending account matches.
#[utoipa::path(
    post,
    path = "/api/v1/users/activation/resend",
    request_body = ResendActivationRequest,
    responses(
        (status = 202, description = "Accepted; mailed when a pending account matches"),
        (status = 400, description = "Invalid email", body = Error),
        (status = 500, description = "Internal server error", body = Error),
        (status = 503, description = "Record store unavailable", body = Error)
    ),
    tags = ["users"],
    operation_id = "resendActivation",
    security([])
)]
#[post("/users/activation/resend")]
pub async fn resend_activation(
    state: web::Data<HttpState>,
    payload: web::Json<ResendActivationRequest>,
) -> ApiResult<HttpResponse> {
    state
        .registration
        .resend_invitation(&payload.into_inner().email)
        .await?;
    Ok(HttpResponse::Accepted().finish())
}

/// Redeem an activation token.
#[utoipa::path(
    put,
    path = "/api/v1/users/activate/{token}",
    params(("token" = String, Path, description = "One-time activation token")),
    responses(
        (status = 200, description = "Account activated", body = AccountResponse),
        (status = 404, description = "Unknown or expired token", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "activateUser",
    security([])
)]
#[put("/users/activate/{token}")]
pub async fn activate(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<AccountResponse>> {
    let token = InvitationToken::from_presented(path.into_inner());
    let user = state.activation.activate(&token).await?;
    Ok(web::Json(AccountResponse::from(&user)))
}

/// Fetch a public profile.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User identifier")),
    responses(
        (status = 200, description = "Profile", body = UserResponse),
        (status = 400, description = "Invalid identifier", body = Error),
        (status = 404, description = "Unknown user", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUser",
    security([])
)]
#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserResponse>> {
    let id: UserId = parse_id(&path, USER_ID)?;
    let user = state.users.fetch_user(id).await?;
    Ok(web::Json(UserResponse::from(&user)))
}

/// Follow a user as the authenticated caller.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/follow",
    params(("id" = i64, Path, description = "User to follow")),
    responses(
        (status = 204, description = "Now following"),
        (status = 400, description = "Self-follow or invalid identifier", body = Error),
        (status = 401, description = "Missing or invalid token", body = Error),
        (status = 404, description = "Unknown user", body = Error),
        (status = 409, description = "Already following", body = Error)
    ),
    tags = ["users"],
    operation_id = "followUser",
    security(("BearerToken" = []))
)]
#[put("/users/{id}/follow")]
pub async fn follow(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let followed: UserId = parse_id(&path, USER_ID)?;
    state.follows.follow(caller.id(), followed).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Stop following a user. Succeeds when no edge exists.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}/follow",
    params(("id" = i64, Path, description = "User to unfollow")),
    responses(
        (status = 204, description = "Not following"),
        (status = 400, description = "Invalid identifier", body = Error),
        (status = 401, description = "Missing or invalid token", body = Error)
    ),
    tags = ["users"],
    operation_id = "unfollowUser",
    security(("BearerToken" = []))
)]
#[delete("/users/{id}/follow")]
pub async fn unfollow(
    state: web::Data<HttpState>,
    caller: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let followed: UserId = parse_id(&path, USER_ID)?;
    state.follows.unfollow(caller.id(), followed).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests;
