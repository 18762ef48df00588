//! OpenAPI schema definitions for wrapper types.
//!
//! The `pagination` crate stays framework-agnostic and does not derive
//! `ToSchema`. These wrappers mirror the serialized shape of its envelopes so
//! the feed endpoint can be documented.

use utoipa::ToSchema;

use super::feed::FeedEntryResponse;

/// OpenAPI schema for [`pagination::PaginationLinks`].
#[derive(ToSchema)]
#[schema(as = PaginationLinks)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct PaginationLinksSchema {
    /// The current window.
    #[schema(rename = "self", example = "/api/v1/users/feed?limit=20&offset=20")]
    self_: String,
    /// The following window, present while pages are full.
    #[schema(example = "/api/v1/users/feed?limit=20&offset=40")]
    next: Option<String>,
    /// The preceding window, absent on the first page.
    #[schema(example = "/api/v1/users/feed?limit=20&offset=0")]
    prev: Option<String>,
}

/// OpenAPI schema for a feed window wrapped in [`pagination::Paginated`].
#[derive(ToSchema)]
#[schema(as = FeedPage)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct FeedPageSchema {
    /// Entries in the requested order.
    data: Vec<FeedEntryResponse>,
    /// Effective page size after clamping.
    #[schema(example = 20)]
    limit: u32,
    /// Entries skipped before this window.
    #[schema(example = 0)]
    offset: u64,
    /// Navigation links.
    links: PaginationLinksSchema,
}
