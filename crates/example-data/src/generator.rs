//! Deterministic dataset generation from seed definitions.
//!
//! The same registry and seed definition always produce an identical
//! dataset: every random choice is drawn from one `ChaCha8Rng` seeded with
//! the definition's seed value, in a fixed order.

use fake::Fake;
use fake::faker::lorem::raw::Sentence;
use fake::faker::name::raw::{FirstName, LastName};
use fake::locales::EN;
use rand::distr::Alphanumeric;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::GenerationError;
use crate::registry::{SeedDefinition, SeedRegistry};
use crate::seed::{
    ExampleCommentSeed, ExampleDataset, ExampleFollowSeed, ExampleLikeSeed, ExamplePostSeed,
    ExampleUserSeed,
};
use crate::validation::{
    COMMENT_MAX, CONTENT_MAX, TAGS_MAX, TITLE_MAX, clamp_text, is_valid_username,
    sanitize_username,
};

/// Maximum number of attempts to generate a valid username.
const MAX_NAME_ATTEMPTS: usize = 100;

/// Length of generated demo passwords.
const PASSWORD_LENGTH: usize = 16;

/// Domain used for generated email addresses.
const EMAIL_DOMAIN: &str = "example.com";

/// Upper bound on tags per generated post.
const MAX_POST_TAGS: usize = 3;

/// Upper bound on comments per generated post.
const MAX_COMMENTS: usize = 3;

/// One in `FOLLOW_ODDS` ordered user pairs becomes a follow edge.
const FOLLOW_ODDS: u32 = 3;

/// One in `LIKE_ODDS` (user, post) pairs becomes a like.
const LIKE_ODDS: u32 = 4;

/// Generates a dataset from a seed definition.
///
/// The dataset contains:
///
/// - `user_count` users with unique usernames and emails
/// - `posts_per_user` posts per user, tagged from the registry vocabulary,
///   each with a few comments by random users
/// - follow edges between distinct users
/// - likes on posts by users other than the author
///
/// # Errors
///
/// Returns [`GenerationError`] if username generation fails after maximum
/// retries or the registry has no tags.
///
/// # Example
///
/// ```
/// use example_data::{SeedRegistry, generate_example_dataset};
///
/// let json = r#"{
///     "version": 1,
///     "tags": ["rust"],
///     "seeds": [{"name": "test", "seed": 42, "userCount": 3, "postsPerUser": 1}]
/// }"#;
///
/// let registry = SeedRegistry::from_json(json).expect("valid");
/// let seed_def = registry.find_seed("test").expect("found");
/// let dataset = generate_example_dataset(&registry, seed_def).expect("generated");
///
/// assert_eq!(dataset.users.len(), 3);
/// assert_eq!(dataset.posts.len(), 3);
/// let again = generate_example_dataset(&registry, seed_def).expect("generated");
/// assert_eq!(dataset, again);
/// ```
pub fn generate_example_dataset(
    registry: &SeedRegistry,
    seed_def: &SeedDefinition,
) -> Result<ExampleDataset, GenerationError> {
    if registry.tags().is_empty() {
        return Err(GenerationError::NoTags);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed_def.seed());
    let users = (0..seed_def.user_count())
        .map(|index| generate_user(&mut rng, index))
        .collect::<Result<Vec<_>, _>>()?;
    let posts = generate_posts(
        &mut rng,
        registry.tags(),
        users.len(),
        seed_def.posts_per_user(),
    );
    let follows = generate_follows(&mut rng, users.len());
    let likes = generate_likes(&mut rng, users.len(), &posts);

    Ok(ExampleDataset {
        users,
        posts,
        follows,
        likes,
    })
}

/// Generates a single account. The position suffix keeps usernames, and so
/// emails, unique within the dataset.
fn generate_user(rng: &mut ChaCha8Rng, index: usize) -> Result<ExampleUserSeed, GenerationError> {
    let username = generate_username(rng, index)?;
    let email = format!("{username}@{EMAIL_DOMAIN}");
    let password = (0..PASSWORD_LENGTH)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect();

    Ok(ExampleUserSeed {
        username,
        email,
        password,
    })
}

fn generate_username(rng: &mut ChaCha8Rng, index: usize) -> Result<String, GenerationError> {
    for _ in 0..MAX_NAME_ATTEMPTS {
        let first: String = FirstName(EN).fake_with_rng(rng);
        let last: String = LastName(EN).fake_with_rng(rng);
        let candidate = sanitize_username(&format!("{first}_{last}_{index}"));

        if is_valid_username(&candidate) {
            return Ok(candidate);
        }
    }

    Err(GenerationError::UsernameGenerationFailed {
        max_attempts: MAX_NAME_ATTEMPTS,
    })
}

fn generate_posts(
    rng: &mut ChaCha8Rng,
    tags: &[String],
    user_count: usize,
    posts_per_user: usize,
) -> Vec<ExamplePostSeed> {
    let mut posts = Vec::with_capacity(user_count.saturating_mul(posts_per_user));
    for author in 0..user_count {
        for _ in 0..posts_per_user {
            let title: String = Sentence(EN, 2..6).fake_with_rng(rng);
            let content: String = Sentence(EN, 8..20).fake_with_rng(rng);
            let post_tags = select_subset(rng, tags, 0, MAX_POST_TAGS.min(TAGS_MAX));
            let comments = generate_comments(rng, user_count);
            posts.push(ExamplePostSeed {
                author,
                title: clamp_text(&title, TITLE_MAX),
                content: clamp_text(&content, CONTENT_MAX),
                tags: post_tags,
                comments,
            });
        }
    }
    posts
}

fn generate_comments(rng: &mut ChaCha8Rng, user_count: usize) -> Vec<ExampleCommentSeed> {
    let count = rng.random_range(0..=MAX_COMMENTS);
    (0..count)
        .map(|_| {
            let content: String = Sentence(EN, 3..12).fake_with_rng(rng);
            ExampleCommentSeed {
                author: rng.random_range(0..user_count),
                content: clamp_text(&content, COMMENT_MAX),
            }
        })
        .collect()
}

fn generate_follows(rng: &mut ChaCha8Rng, user_count: usize) -> Vec<ExampleFollowSeed> {
    let mut follows = Vec::new();
    for follower in 0..user_count {
        for followed in 0..user_count {
            if follower != followed && rng.random_ratio(1, FOLLOW_ODDS) {
                follows.push(ExampleFollowSeed { follower, followed });
            }
        }
    }
    follows
}

fn generate_likes(
    rng: &mut ChaCha8Rng,
    user_count: usize,
    posts: &[ExamplePostSeed],
) -> Vec<ExampleLikeSeed> {
    let mut likes = Vec::new();
    for (post, seed) in posts.iter().enumerate() {
        for user in 0..user_count {
            if user != seed.author && rng.random_ratio(1, LIKE_ODDS) {
                likes.push(ExampleLikeSeed { user, post });
            }
        }
    }
    likes
}

/// Selects a deterministic subset of `items`.
///
/// The selection count is drawn between `min_count` and `max_count`, both
/// clamped to the number of available items.
fn select_subset(
    rng: &mut ChaCha8Rng,
    items: &[String],
    min_count: usize,
    max_count: usize,
) -> Vec<String> {
    if items.is_empty() {
        return Vec::new();
    }

    let clamped_min = min_count.min(items.len());
    let clamped_max = max_count.min(items.len());
    let count = if clamped_min == clamped_max {
        clamped_min
    } else {
        rng.random_range(clamped_min..=clamped_max)
    };

    let mut shuffled = items.to_vec();
    shuffled.shuffle(rng);
    shuffled.truncate(count);
    shuffled
}
