//! Generated dataset types.
//!
//! These types are independent of backend domain types to avoid circular
//! dependencies. Cross references use positions in the dataset's vectors,
//! since database identifiers only exist once the records are inserted.

use serde::{Deserialize, Serialize};

/// A generated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleUserSeed {
    /// Unique handle.
    pub username: String,
    /// Unique contact address derived from the username.
    pub email: String,
    /// Plaintext password so the demo account can sign in.
    pub password: String,
}

/// A generated comment on the enclosing post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleCommentSeed {
    /// Index of the commenting user in [`ExampleDataset::users`].
    pub author: usize,
    /// Comment body.
    pub content: String,
}

/// A generated post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamplePostSeed {
    /// Index of the author in [`ExampleDataset::users`].
    pub author: usize,
    /// Headline.
    pub title: String,
    /// Body.
    pub content: String,
    /// Tags drawn from the registry vocabulary.
    pub tags: Vec<String>,
    /// Comments in creation order.
    pub comments: Vec<ExampleCommentSeed>,
}

/// A generated follow edge between two distinct users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleFollowSeed {
    /// Index of the following user.
    pub follower: usize,
    /// Index of the followed user.
    pub followed: usize,
}

/// A generated like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleLikeSeed {
    /// Index of the liking user.
    pub user: usize,
    /// Index of the liked post in [`ExampleDataset::posts`].
    pub post: usize,
}

/// Everything one seed produces.
///
/// # Example
///
/// ```
/// use example_data::{ExampleDataset, ExampleUserSeed};
///
/// let dataset = ExampleDataset {
///     users: vec![ExampleUserSeed {
///         username: "ada".to_owned(),
///         email: "ada@example.com".to_owned(),
///         password: "correct horse".to_owned(),
///     }],
///     ..ExampleDataset::default()
/// };
///
/// assert_eq!(dataset.comment_count(), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleDataset {
    /// Accounts, in insertion order.
    pub users: Vec<ExampleUserSeed>,
    /// Posts with their comments.
    pub posts: Vec<ExamplePostSeed>,
    /// Follow edges.
    pub follows: Vec<ExampleFollowSeed>,
    /// Likes.
    pub likes: Vec<ExampleLikeSeed>,
}

impl ExampleDataset {
    /// Total number of comments across all posts.
    #[must_use]
    pub fn comment_count(&self) -> usize {
        self.posts.iter().map(|post| post.comments.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_serializes_to_camel_case() {
        let dataset = ExampleDataset {
            follows: vec![ExampleFollowSeed {
                follower: 0,
                followed: 1,
            }],
            ..ExampleDataset::default()
        };
        let json = serde_json::to_value(&dataset).expect("serialize");
        assert_eq!(json["follows"][0]["followed"], 1);
        assert!(json.get("likes").is_some());
    }
}
