//! Posts, comments and their validated fields.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// Maximum title length, in characters.
pub const TITLE_MAX: usize = 100;
/// Maximum post body length, in characters.
pub const CONTENT_MAX: usize = 200;
/// Maximum length of a single tag, in characters.
pub const TAG_MAX: usize = 50;
/// Maximum number of tags on a post.
pub const TAGS_MAX: usize = 10;
/// Maximum comment length, in characters.
pub const COMMENT_MAX: usize = 200;

/// Validation errors for post and comment fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PostValidationError {
    /// The post or comment id was not a positive integer.
    #[error("id must be a positive integer")]
    InvalidId,
    /// The title was blank.
    #[error("title must not be empty")]
    EmptyTitle,
    /// The title exceeded [`TITLE_MAX`].
    #[error("title must be at most {max} characters")]
    TitleTooLong {
        /// Maximum permitted length.
        max: usize,
    },
    /// The body was blank.
    #[error("content must not be empty")]
    EmptyContent,
    /// The body exceeded [`CONTENT_MAX`].
    #[error("content must be at most {max} characters")]
    ContentTooLong {
        /// Maximum permitted length.
        max: usize,
    },
    /// A tag was blank.
    #[error("tags must not be empty")]
    EmptyTag,
    /// A tag exceeded [`TAG_MAX`].
    #[error("tags must be at most {max} characters")]
    TagTooLong {
        /// Maximum permitted length.
        max: usize,
    },
    /// More than [`TAGS_MAX`] distinct tags.
    #[error("at most {max} tags are allowed")]
    TooManyTags {
        /// Maximum permitted count.
        max: usize,
    },
    /// A comment was blank.
    #[error("comment must not be empty")]
    EmptyComment,
    /// A comment exceeded [`COMMENT_MAX`].
    #[error("comment must be at most {max} characters")]
    CommentTooLong {
        /// Maximum permitted length.
        max: usize,
    },
    /// An update carried no fields.
    #[error("update must change at least one field")]
    EmptyUpdate,
}

impl PostValidationError {
    /// Request field the failure belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidId => "id",
            Self::EmptyTitle | Self::TitleTooLong { .. } => "title",
            Self::EmptyContent | Self::ContentTooLong { .. } => "content",
            Self::EmptyTag | Self::TagTooLong { .. } | Self::TooManyTags { .. } => "tags",
            Self::EmptyComment | Self::CommentTooLong { .. } => "content",
            Self::EmptyUpdate => "body",
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidId => "invalid_id",
            Self::EmptyTitle => "empty_title",
            Self::TitleTooLong { .. } => "title_too_long",
            Self::EmptyContent => "empty_content",
            Self::ContentTooLong { .. } => "content_too_long",
            Self::EmptyTag => "empty_tag",
            Self::TagTooLong { .. } => "tag_too_long",
            Self::TooManyTags { .. } => "too_many_tags",
            Self::EmptyComment => "empty_comment",
            Self::CommentTooLong { .. } => "comment_too_long",
            Self::EmptyUpdate => "empty_update",
        }
    }
}

fn bounded_text(
    raw: &str,
    max: usize,
    empty: PostValidationError,
    too_long: PostValidationError,
) -> Result<String, PostValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(empty);
    }
    if trimmed.chars().count() > max {
        return Err(too_long);
    }
    Ok(trimmed.to_owned())
}

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a store-assigned identifier.
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Raw identifier value.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = PostValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.parse::<i64>() {
                    Ok(id) if id > 0 => Ok(Self(id)),
                    _ => Err(PostValidationError::InvalidId),
                }
            }
        }
    };
}

numeric_id!(
    /// Store-assigned post identifier.
    PostId
);
numeric_id!(
    /// Store-assigned comment identifier.
    CommentId
);

macro_rules! bounded_string {
    ($(#[$meta:meta])* $name:ident, $max:expr, $empty:expr, $too_long:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Trim and validate the input.
            pub fn new(raw: impl AsRef<str>) -> Result<Self, PostValidationError> {
                bounded_text(raw.as_ref(), $max, $empty, $too_long).map(Self)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = PostValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

bounded_string!(
    /// Post headline, 1 to [`TITLE_MAX`] characters after trimming.
    Title,
    TITLE_MAX,
    PostValidationError::EmptyTitle,
    PostValidationError::TitleTooLong { max: TITLE_MAX }
);
bounded_string!(
    /// Post body, 1 to [`CONTENT_MAX`] characters after trimming.
    Content,
    CONTENT_MAX,
    PostValidationError::EmptyContent,
    PostValidationError::ContentTooLong { max: CONTENT_MAX }
);
bounded_string!(
    /// Comment body, 1 to [`COMMENT_MAX`] characters after trimming.
    CommentBody,
    COMMENT_MAX,
    PostValidationError::EmptyComment,
    PostValidationError::CommentTooLong { max: COMMENT_MAX }
);

/// Deduplicated set of free-text tags.
///
/// Order of first appearance is kept so clients see tags as they wrote them.
///
/// # Examples
/// ```
/// use social_backend::domain::Tags;
///
/// let tags = Tags::new(["rust", " async ", "rust"]).expect("valid tags");
/// assert_eq!(tags.as_slice(), ["rust", "async"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Tags(Vec<String>);

impl Tags {
    /// Validate each tag, drop duplicates, then enforce the count limit.
    pub fn new<I, S>(raw: I) -> Result<Self, PostValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tags: Vec<String> = Vec::new();
        for tag in raw {
            let tag = bounded_text(
                tag.as_ref(),
                TAG_MAX,
                PostValidationError::EmptyTag,
                PostValidationError::TagTooLong { max: TAG_MAX },
            )?;
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        if tags.len() > TAGS_MAX {
            return Err(PostValidationError::TooManyTags { max: TAGS_MAX });
        }
        Ok(Self(tags))
    }

    /// Tags in first-seen order.
    pub fn as_slice(&self) -> &[String] {
        self.0.as_slice()
    }

    /// `true` when the post has no tags.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Tags> for Vec<String> {
    fn from(value: Tags) -> Self {
        value.0
    }
}

impl TryFrom<Vec<String>> for Tags {
    type Error = PostValidationError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Persisted post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Store-assigned identifier.
    pub id: PostId,
    /// Owning user.
    pub author_id: UserId,
    /// Headline.
    pub title: Title,
    /// Body.
    pub content: Content,
    /// Free-text tags.
    pub tags: Tags,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Validated post awaiting insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    /// Owning user.
    pub author_id: UserId,
    /// Headline.
    pub title: Title,
    /// Body.
    pub content: Content,
    /// Free-text tags.
    pub tags: Tags,
    /// Creation timestamp, also used as the initial update timestamp.
    pub created_at: DateTime<Utc>,
}

/// Partial update to a post. At least one field is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostChanges {
    title: Option<Title>,
    content: Option<Content>,
}

impl PostChanges {
    /// Combine optional fields, rejecting an update that changes nothing.
    pub fn new(
        title: Option<Title>,
        content: Option<Content>,
    ) -> Result<Self, PostValidationError> {
        if title.is_none() && content.is_none() {
            return Err(PostValidationError::EmptyUpdate);
        }
        Ok(Self { title, content })
    }

    /// Replacement title, when present.
    pub fn title(&self) -> Option<&Title> {
        self.title.as_ref()
    }

    /// Replacement body, when present.
    pub fn content(&self) -> Option<&Content> {
        self.content.as_ref()
    }

    /// Apply to `post` in place.
    pub fn apply_to(&self, post: &mut Post, updated_at: DateTime<Utc>) {
        if let Some(title) = &self.title {
            post.title = title.clone();
        }
        if let Some(content) = &self.content {
            post.content = content.clone();
        }
        post.updated_at = updated_at;
    }
}

/// Persisted comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Store-assigned identifier.
    pub id: CommentId,
    /// Post the comment belongs to.
    pub post_id: PostId,
    /// Commenting user.
    pub author_id: UserId,
    /// Body.
    pub content: CommentBody,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Validated comment awaiting insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    /// Post being commented on.
    pub post_id: PostId,
    /// Commenting user.
    pub author_id: UserId,
    /// Body.
    pub content: CommentBody,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A post together with its comments, oldest comment first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostThread {
    /// The post.
    pub post: Post,
    /// Its comments.
    pub comments: Vec<Comment>,
}
