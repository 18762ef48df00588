//! Example data seeding orchestration.
//!
//! Converts a generated [`ExampleDataset`] into domain requests and drives
//! them through the registration, activation, follow and post ports.

use std::sync::Arc;

use chrono::TimeDelta;
use example_data::{
    ExampleDataset, GenerationError, RegistryError, SeedRegistry, generate_example_dataset,
};
use mockable::Clock;
use thiserror::Error;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::domain::ports::{
    ActivationCommand, CreatePostRequest, FollowCommand, FollowRepository, InvitationRepository,
    PostCommand, PostRepository, RegistrationCommand, RegistrationRequest, UserRepository,
};
use crate::domain::{
    ActivationService, CredentialVault, Error, ErrorCode, FollowerGraph, InvitationLedger,
    PostId, PostService, RegistrationOrchestrator, RegistrationSettings, UserId,
};
use crate::outbound::mail::LoggingMailSender;

use super::config::SeedSelection;

/// Whether a seed run wrote anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedingResult {
    /// The dataset was inserted.
    Applied,
    /// The first generated account already exists; nothing was written.
    AlreadySeeded,
}

/// Result of attempting to apply example data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedOutcome {
    /// Seed name the dataset was generated from.
    pub seed_key: String,
    /// Accounts registered and activated.
    pub users: usize,
    /// Posts published.
    pub posts: usize,
    /// Comments written.
    pub comments: usize,
    /// Follow edges created.
    pub follows: usize,
    /// Likes recorded.
    pub likes: usize,
    /// Whether the run wrote anything.
    pub result: SeedingResult,
}

/// Errors raised while preparing or applying example data.
#[derive(Debug, Error)]
pub enum ExampleDataSeedingError {
    /// Seed registry lookups failed.
    #[error("seed registry error: {0}")]
    Registry(#[from] RegistryError),
    /// Dataset generation failed.
    #[error("example data generation failed: {0}")]
    Generation(#[from] GenerationError),
    /// A generated record references a user or post outside the dataset.
    #[error("generated {kind} index {index} is out of range")]
    DanglingReference {
        /// `"user"` or `"post"`.
        kind: &'static str,
        /// The offending position.
        index: usize,
    },
    /// A domain port rejected a generated record.
    #[error("seeding step '{step}' failed: {source}")]
    Domain {
        /// Step that failed.
        step: &'static str,
        /// Domain error returned by the port.
        #[source]
        source: Error,
    },
}

impl ExampleDataSeedingError {
    fn domain(step: &'static str) -> impl FnOnce(Error) -> Self {
        move |source| Self::Domain { step, source }
    }
}

/// Generate the dataset `selection` names without writing it anywhere.
///
/// # Errors
///
/// Returns [`ExampleDataSeedingError::Registry`] for an unknown seed and
/// [`ExampleDataSeedingError::Generation`] when generation fails.
pub fn plan_dataset(
    registry: &SeedRegistry,
    selection: &SeedSelection,
) -> Result<ExampleDataset, ExampleDataSeedingError> {
    let mut definition = registry.find_seed(&selection.name)?.clone();
    if let Some(count) = selection.user_count {
        definition = definition.with_user_count(count);
    }
    Ok(generate_example_dataset(registry, &definition)?)
}

/// Driving ports the seeder writes through.
#[derive(Clone)]
pub struct SeedPorts {
    /// Account creation.
    pub registration: Arc<dyn RegistrationCommand>,
    /// Invitation redemption.
    pub activation: Arc<dyn ActivationCommand>,
    /// Follow graph mutations.
    pub follows: Arc<dyn FollowCommand>,
    /// Post, comment and like mutations.
    pub posts: Arc<dyn PostCommand>,
}

impl SeedPorts {
    /// Wire the domain services over the given repositories.
    ///
    /// Activation mail is only logged; seeded accounts are activated
    /// directly with the token registration returns.
    pub fn over<U, I, F, P>(
        users: Arc<U>,
        invitations: Arc<I>,
        follows: Arc<F>,
        posts: Arc<P>,
        vault: CredentialVault,
        clock: Arc<dyn Clock>,
    ) -> Self
    where
        U: UserRepository + 'static,
        I: InvitationRepository + 'static,
        F: FollowRepository + 'static,
        P: PostRepository + 'static,
    {
        let ledger = || {
            InvitationLedger::new(
                Arc::clone(&invitations),
                Arc::clone(&clock),
                TimeDelta::hours(1),
            )
        };
        Self {
            registration: Arc::new(RegistrationOrchestrator::new(
                users,
                ledger(),
                Arc::new(LoggingMailSender),
                vault,
                RegistrationSettings::new("http://localhost", "development"),
            )),
            activation: Arc::new(ActivationService::new(ledger())),
            follows: Arc::new(FollowerGraph::new(follows)),
            posts: Arc::new(PostService::new(posts, clock)),
        }
    }
}

/// Service that orchestrates example data seeding.
#[derive(Clone)]
pub struct ExampleDataSeeder {
    ports: SeedPorts,
}

impl ExampleDataSeeder {
    /// Create a seeder writing through `ports`.
    pub fn new(ports: SeedPorts) -> Self {
        Self { ports }
    }

    /// Generate and apply the dataset `selection` names within `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`ExampleDataSeedingError`] if registry lookup, generation or
    /// any domain step fails.
    pub async fn seed_from_registry(
        &self,
        registry: &SeedRegistry,
        selection: &SeedSelection,
    ) -> Result<SeedOutcome, ExampleDataSeedingError> {
        let dataset = plan_dataset(registry, selection)?;
        self.apply(&selection.name, &dataset).await
    }

    /// Insert `dataset`. Stops without writing when its first account
    /// already exists.
    ///
    /// # Errors
    ///
    /// Returns [`ExampleDataSeedingError`] when a port rejects a record or a
    /// record points outside the dataset.
    pub async fn apply(
        &self,
        seed_key: &str,
        dataset: &ExampleDataset,
    ) -> Result<SeedOutcome, ExampleDataSeedingError> {
        let mut outcome = SeedOutcome {
            seed_key: seed_key.to_owned(),
            users: 0,
            posts: 0,
            comments: 0,
            follows: 0,
            likes: 0,
            result: SeedingResult::Applied,
        };

        let Some(user_ids) = self.register_users(dataset).await? else {
            info!(seed_key, "example data already present; skipping");
            outcome.result = SeedingResult::AlreadySeeded;
            return Ok(outcome);
        };
        outcome.users = user_ids.len();

        for edge in &dataset.follows {
            let follower = lookup(&user_ids, edge.follower, "user")?;
            let followed = lookup(&user_ids, edge.followed, "user")?;
            self.ports
                .follows
                .follow(follower, followed)
                .await
                .map_err(ExampleDataSeedingError::domain("follow"))?;
            outcome.follows += 1;
        }

        let mut post_ids: Vec<PostId> = Vec::with_capacity(dataset.posts.len());
        for seed in &dataset.posts {
            let author = lookup(&user_ids, seed.author, "user")?;
            let post = self
                .ports
                .posts
                .create(
                    author,
                    CreatePostRequest {
                        title: seed.title.clone(),
                        content: seed.content.clone(),
                        tags: seed.tags.clone(),
                    },
                )
                .await
                .map_err(ExampleDataSeedingError::domain("create post"))?;
            for comment in &seed.comments {
                let commenter = lookup(&user_ids, comment.author, "user")?;
                self.ports
                    .posts
                    .comment(commenter, post.id, comment.content.clone())
                    .await
                    .map_err(ExampleDataSeedingError::domain("comment"))?;
                outcome.comments += 1;
            }
            post_ids.push(post.id);
        }
        outcome.posts = post_ids.len();

        for like in &dataset.likes {
            let user = lookup(&user_ids, like.user, "user")?;
            let post = lookup(&post_ids, like.post, "post")?;
            self.ports
                .posts
                .like(user, post)
                .await
                .map_err(ExampleDataSeedingError::domain("like"))?;
            outcome.likes += 1;
        }

        info!(
            seed_key,
            users = outcome.users,
            posts = outcome.posts,
            comments = outcome.comments,
            follows = outcome.follows,
            likes = outcome.likes,
            "example data seeding applied"
        );
        Ok(outcome)
    }

    /// Register and activate every account. Returns `None` when the first
    /// account is already taken.
    async fn register_users(
        &self,
        dataset: &ExampleDataset,
    ) -> Result<Option<Vec<UserId>>, ExampleDataSeedingError> {
        let mut ids = Vec::with_capacity(dataset.users.len());
        for (index, seed) in dataset.users.iter().enumerate() {
            let request = RegistrationRequest {
                username: seed.username.clone(),
                email: seed.email.clone(),
                password: Zeroizing::new(seed.password.clone()),
            };
            let registration = match self.ports.registration.register(request).await {
                Ok(registration) => registration,
                Err(err) if index == 0 && err.code() == ErrorCode::Conflict => return Ok(None),
                Err(err) => return Err(ExampleDataSeedingError::domain("register")(err)),
            };
            let user = self
                .ports
                .activation
                .activate(&registration.token)
                .await
                .map_err(ExampleDataSeedingError::domain("activate"))?;
            debug!(user_id = %user.id(), "seeded user activated");
            ids.push(user.id());
        }
        Ok(Some(ids))
    }
}

fn lookup<T: Copy>(
    ids: &[T],
    index: usize,
    kind: &'static str,
) -> Result<T, ExampleDataSeedingError> {
    ids.get(index)
        .copied()
        .ok_or(ExampleDataSeedingError::DanglingReference { kind, index })
}

#[cfg(test)]
mod tests {
    //! Seeding against the in-memory store.

    use super::*;
    use crate::domain::ports::{FeedQueryService, PostQuery, UserQuery};
    use crate::domain::{CredentialCost, Email, FeedEngine, RawFeedParams, UserDirectory};
    use crate::outbound::memory::InMemoryStore;
    use example_data::{ExampleFollowSeed, ExampleLikeSeed, ExamplePostSeed, ExampleUserSeed};
    use mockable::DefaultClock;
    use rstest::{fixture, rstest};

    const REGISTRY_JSON: &str = r#"{
        "version": 1,
        "tags": ["rust", "hiking"],
        "seeds": [{"name": "tiny", "seed": 7, "userCount": 3, "postsPerUser": 1}]
    }"#;

    #[fixture]
    fn store() -> Arc<InMemoryStore> {
        Arc::new(InMemoryStore::default())
    }

    fn seeder(store: &Arc<InMemoryStore>) -> ExampleDataSeeder {
        let vault = CredentialVault::new(CredentialCost::minimal()).expect("argon2 parameters");
        ExampleDataSeeder::new(SeedPorts::over(
            Arc::clone(store),
            Arc::clone(store),
            Arc::clone(store),
            Arc::clone(store),
            vault,
            Arc::new(DefaultClock),
        ))
    }

    fn selection(name: &str) -> SeedSelection {
        SeedSelection {
            name: name.to_owned(),
            user_count: None,
        }
    }

    #[rstest]
    fn planning_honours_the_user_override() {
        let registry = SeedRegistry::from_json(REGISTRY_JSON).expect("registry");
        let dataset = plan_dataset(
            &registry,
            &SeedSelection {
                user_count: Some(5),
                ..selection("tiny")
            },
        )
        .expect("dataset");
        assert_eq!(dataset.users.len(), 5);
        assert_eq!(dataset.posts.len(), 5);
    }

    #[rstest]
    fn planning_an_unknown_seed_fails() {
        let registry = SeedRegistry::from_json(REGISTRY_JSON).expect("registry");
        let err = plan_dataset(&registry, &selection("missing")).expect_err("unknown seed");
        assert!(matches!(
            err,
            ExampleDataSeedingError::Registry(RegistryError::SeedNotFound { .. })
        ));
    }

    fn user(name: &str) -> ExampleUserSeed {
        ExampleUserSeed {
            username: name.to_owned(),
            email: format!("{name}@example.com"),
            password: "password123".to_owned(),
        }
    }

    fn two_user_dataset() -> ExampleDataset {
        ExampleDataset {
            users: vec![user("ada"), user("grace")],
            posts: vec![ExamplePostSeed {
                author: 1,
                title: "Compilers".to_owned(),
                content: "Notes on the first compiler".to_owned(),
                tags: vec!["history".to_owned()],
                comments: vec![],
            }],
            follows: vec![ExampleFollowSeed {
                follower: 0,
                followed: 1,
            }],
            likes: vec![ExampleLikeSeed { user: 0, post: 0 }],
        }
    }

    #[rstest]
    #[tokio::test]
    async fn seeded_accounts_are_active_and_counts_match(store: Arc<InMemoryStore>) {
        let registry = SeedRegistry::from_json(REGISTRY_JSON).expect("registry");
        let outcome = seeder(&store)
            .seed_from_registry(&registry, &selection("tiny"))
            .await
            .expect("seeding succeeds");

        assert_eq!(outcome.result, SeedingResult::Applied);
        assert_eq!(outcome.users, 3);
        assert_eq!(outcome.posts, 3);

        let dataset = generate_example_dataset(
            &registry,
            registry.find_seed("tiny").expect("seed"),
        )
        .expect("dataset");
        for seed in &dataset.users {
            let email = Email::new(&seed.email).expect("email");
            let stored = store
                .find_by_email(&email)
                .await
                .expect("lookup")
                .expect("user exists");
            assert!(stored.activation().is_active(), "{} should be active", seed.username);
        }
    }

    #[rstest]
    #[tokio::test]
    async fn seeded_follows_feed_the_follower(store: Arc<InMemoryStore>) {
        let outcome = seeder(&store)
            .apply("manual", &two_user_dataset())
            .await
            .expect("seeding succeeds");
        assert_eq!((outcome.follows, outcome.likes), (1, 1));

        let ada = store
            .find_by_email(&Email::new("ada@example.com").expect("email"))
            .await
            .expect("lookup")
            .expect("ada exists");
        let page = FeedEngine::new(Arc::clone(&store))
            .feed(ada.id(), &RawFeedParams::default())
            .await
            .expect("feed");
        let entry = page.entries.first().expect("grace's post appears");
        assert_eq!(entry.like_count, 1);

        let thread = PostService::new(Arc::clone(&store), Arc::new(DefaultClock))
            .get(entry.post.id)
            .await
            .expect("thread");
        assert_eq!(thread.post.tags.as_slice(), ["history"]);
        let profile = UserDirectory::new(Arc::clone(&store))
            .fetch_user(thread.post.author_id)
            .await
            .expect("author profile");
        assert_eq!(profile.username().as_ref(), "grace");
    }

    #[rstest]
    #[tokio::test]
    async fn reseeding_is_skipped(store: Arc<InMemoryStore>) {
        let seeder = seeder(&store);
        seeder
            .apply("manual", &two_user_dataset())
            .await
            .expect("first run");

        let second = seeder
            .apply("manual", &two_user_dataset())
            .await
            .expect("second run");
        assert_eq!(second.result, SeedingResult::AlreadySeeded);
        assert_eq!(second.users, 0);
    }

    #[rstest]
    #[tokio::test]
    async fn dangling_references_are_reported(store: Arc<InMemoryStore>) {
        let mut dataset = two_user_dataset();
        dataset.likes.push(ExampleLikeSeed { user: 0, post: 9 });

        let err = seeder(&store)
            .apply("manual", &dataset)
            .await
            .expect_err("like points nowhere");
        assert!(matches!(
            err,
            ExampleDataSeedingError::DanglingReference {
                kind: "post",
                index: 9
            }
        ));
    }
}
