//! Feed request parsing and validation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::{Post, TAG_MAX};

/// Page size used when the request names none.
pub const DEFAULT_FEED_LIMIT: u32 = 20;
/// Largest page size served unless configured otherwise.
pub const DEFAULT_FEED_MAX_LIMIT: u32 = 100;
/// Maximum search length, in characters.
pub const SEARCH_MAX: usize = 100;
/// Maximum number of tags in a filter.
pub const FEED_TAGS_MAX: usize = 10;

/// Feed parameter violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedValidationError {
    /// `limit` was not a positive integer.
    #[error("limit must be a positive integer")]
    InvalidLimit,
    /// `offset` was not a non-negative integer.
    #[error("offset must be a non-negative integer")]
    InvalidOffset,
    /// `sort` was neither `asc` nor `desc`.
    #[error("sort must be 'asc' or 'desc'")]
    InvalidSort,
    /// `search` exceeded [`SEARCH_MAX`].
    #[error("search must be at most {max} characters")]
    SearchTooLong {
        /// Maximum permitted length.
        max: usize,
    },
    /// `tags` named more than [`FEED_TAGS_MAX`] entries.
    #[error("at most {max} tags may be given")]
    TooManyTags {
        /// Maximum permitted count.
        max: usize,
    },
    /// A tag exceeded the tag length limit.
    #[error("tags must be at most {max} characters")]
    TagTooLong {
        /// Maximum permitted length.
        max: usize,
    },
    /// `since` or `until` was not an RFC 3339 timestamp.
    #[error("{field} must be an RFC 3339 timestamp")]
    InvalidTimestamp {
        /// Offending parameter.
        field: &'static str,
    },
    /// `since` was after `until`.
    #[error("since must not be after until")]
    InvertedRange,
}

impl FeedValidationError {
    /// Request parameter the failure belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidLimit => "limit",
            Self::InvalidOffset => "offset",
            Self::InvalidSort => "sort",
            Self::SearchTooLong { .. } => "search",
            Self::TooManyTags { .. } | Self::TagTooLong { .. } => "tags",
            Self::InvalidTimestamp { field } => *field,
            Self::InvertedRange => "since",
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidLimit => "invalid_limit",
            Self::InvalidOffset => "invalid_offset",
            Self::InvalidSort => "invalid_sort",
            Self::SearchTooLong { .. } => "search_too_long",
            Self::TooManyTags { .. } => "too_many_tags",
            Self::TagTooLong { .. } => "tag_too_long",
            Self::InvalidTimestamp { .. } => "invalid_timestamp",
            Self::InvertedRange => "inverted_range",
        }
    }
}

/// Creation-time ordering of the feed. Ties break on post id in the same
/// direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    /// Oldest first.
    Asc,
    /// Newest first.
    #[default]
    Desc,
}

impl SortDirection {
    /// Lower-case wire form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// SQL keyword. Only ever one of two literals, so it is safe to splice
    /// into a statement.
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = FeedValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(Self::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(Self::Desc)
        } else {
            Err(FeedValidationError::InvalidSort)
        }
    }
}

/// Unvalidated feed parameters as they arrive from a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawFeedParams {
    /// Page size.
    pub limit: Option<String>,
    /// Number of entries to skip.
    pub offset: Option<String>,
    /// `asc` or `desc`.
    pub sort: Option<String>,
    /// Case-insensitive substring over title or content.
    pub search: Option<String>,
    /// Comma-separated tag list.
    pub tags: Option<String>,
    /// Inclusive lower creation bound.
    pub since: Option<String>,
    /// Inclusive upper creation bound.
    pub until: Option<String>,
}

/// Validated feed query.
///
/// # Examples
/// ```
/// use social_backend::domain::{FeedQuery, RawFeedParams, SortDirection};
///
/// let raw = RawFeedParams {
///     limit: Some("500".into()),
///     sort: Some("ASC".into()),
///     tags: Some("rust, tokio,,rust".into()),
///     ..RawFeedParams::default()
/// };
/// let query = FeedQuery::parse(&raw, 100).expect("valid query");
/// assert_eq!(query.limit(), 100);
/// assert_eq!(query.sort(), SortDirection::Asc);
/// assert_eq!(query.tags(), ["rust", "tokio"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    limit: u32,
    offset: u64,
    sort: SortDirection,
    search: Option<String>,
    tags: Vec<String>,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
}

fn present(raw: Option<&String>) -> Option<&str> {
    raw.map(|value| value.trim()).filter(|value| !value.is_empty())
}

fn parse_timestamp(
    raw: Option<&String>,
    field: &'static str,
) -> Result<Option<DateTime<Utc>>, FeedValidationError> {
    present(raw)
        .map(|value| {
            DateTime::parse_from_rfc3339(value)
                .map(|parsed| parsed.with_timezone(&Utc))
                .map_err(|_| FeedValidationError::InvalidTimestamp { field })
        })
        .transpose()
}

impl FeedQuery {
    /// Validate `raw`, clamping the page size to `max_limit`.
    pub fn parse(raw: &RawFeedParams, max_limit: u32) -> Result<Self, FeedValidationError> {
        let limit = match present(raw.limit.as_ref()) {
            None => DEFAULT_FEED_LIMIT,
            Some(value) => match value.parse::<i64>() {
                Ok(limit) if limit > 0 => u32::try_from(limit).unwrap_or(u32::MAX),
                _ => return Err(FeedValidationError::InvalidLimit),
            },
        }
        .min(max_limit.max(1));

        let offset = match present(raw.offset.as_ref()) {
            None => 0,
            // Bounded by `i64` so every store can bind it.
            Some(value) => value
                .parse::<i64>()
                .ok()
                .and_then(|offset| u64::try_from(offset).ok())
                .ok_or(FeedValidationError::InvalidOffset)?,
        };

        let sort = present(raw.sort.as_ref())
            .map(str::parse::<SortDirection>)
            .transpose()?
            .unwrap_or_default();

        let search = present(raw.search.as_ref()).map(str::to_owned);
        if search
            .as_deref()
            .is_some_and(|value| value.chars().count() > SEARCH_MAX)
        {
            return Err(FeedValidationError::SearchTooLong { max: SEARCH_MAX });
        }

        let mut tags: Vec<String> = Vec::new();
        if let Some(list) = present(raw.tags.as_ref()) {
            for tag in list.split(',').map(str::trim).filter(|tag| !tag.is_empty()) {
                if tag.chars().count() > TAG_MAX {
                    return Err(FeedValidationError::TagTooLong { max: TAG_MAX });
                }
                if !tags.iter().any(|seen| seen == tag) {
                    tags.push(tag.to_owned());
                }
            }
        }
        if tags.len() > FEED_TAGS_MAX {
            return Err(FeedValidationError::TooManyTags { max: FEED_TAGS_MAX });
        }

        let since = parse_timestamp(raw.since.as_ref(), "since")?;
        let until = parse_timestamp(raw.until.as_ref(), "until")?;
        if let (Some(since), Some(until)) = (since, until) {
            if since > until {
                return Err(FeedValidationError::InvertedRange);
            }
        }

        Ok(Self {
            limit,
            offset,
            sort,
            search,
            tags,
            since,
            until,
        })
    }

    /// Page size.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Entries to skip.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Creation-time ordering.
    pub fn sort(&self) -> SortDirection {
        self.sort
    }

    /// Trimmed search term.
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Tag filter; empty means no filter.
    pub fn tags(&self) -> &[String] {
        self.tags.as_slice()
    }

    /// Inclusive lower creation bound.
    pub fn since(&self) -> Option<DateTime<Utc>> {
        self.since
    }

    /// Inclusive upper creation bound.
    pub fn until(&self) -> Option<DateTime<Utc>> {
        self.until
    }

    /// Whether `post` satisfies every content predicate (search, tags,
    /// time window). Authorship and paging are left to the caller.
    pub fn matches(&self, post: &Post) -> bool {
        let search_ok = self.search.as_deref().is_none_or(|term| {
            let needle = term.to_lowercase();
            post.title.as_ref().to_lowercase().contains(&needle)
                || post.content.as_ref().to_lowercase().contains(&needle)
        });
        let tags_ok = self.tags.is_empty()
            || post
                .tags
                .as_slice()
                .iter()
                .any(|tag| self.tags.contains(tag));
        let since_ok = self.since.is_none_or(|since| post.created_at >= since);
        let until_ok = self.until.is_none_or(|until| post.created_at <= until);
        search_ok && tags_ok && since_ok && until_ok
    }
}
