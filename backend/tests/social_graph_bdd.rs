//! Behaviour tests for the account lifecycle and the follower graph.
//!
//! Scenarios run the domain services over the in-memory store with a clock
//! the steps can advance, so invitation expiry is observable without
//! waiting.

#![expect(
    clippy::expect_used,
    reason = "test code uses expect for clear failure messages"
)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{TimeDelta, Utc};
use mockable::Clock;
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};
use serde_json::Value;
use tokio::runtime::Runtime;
use zeroize::Zeroizing;

use social_backend::domain::ports::{CreatePostRequest, RegistrationRequest, UpdatePostRequest};
use social_backend::domain::{
    ActivationService, CredentialCost, CredentialVault, Error, ErrorCode, FeedEngine,
    FollowerGraph, InvitationLedger, InvitationToken, LoginCredentials, PostId, PostService,
    RawFeedParams, RegistrationOrchestrator, RegistrationSettings, TokenIssuanceService,
    TokenSigner, UserDirectory, UserId,
};
use social_backend::inbound::http::state::HttpState;
use social_backend::outbound::mail::LoggingMailSender;
use social_backend::outbound::memory::InMemoryStore;
use social_backend::outbound::token::JwtCodec;
use social_backend::test_support::clock::MutableClock;

const PASSWORD: &str = "correct horse battery";
const SECRET: &str = "a-behaviour-test-secret-of-32-bytes";

// ============================================================================
// Test world
// ============================================================================

#[derive(Clone)]
struct Account {
    id: UserId,
    token: InvitationToken,
}

/// Wired services plus the bookkeeping steps share.
#[derive(Clone)]
struct Backend {
    runtime: Arc<Runtime>,
    state: HttpState,
    clock: Arc<MutableClock>,
    accounts: Arc<Mutex<HashMap<String, Account>>>,
    posts: Arc<Mutex<HashMap<String, PostId>>>,
}

impl Backend {
    fn new() -> Self {
        let clock = Arc::new(MutableClock::new(Utc::now()));
        let dyn_clock: Arc<dyn Clock> = clock.clone();
        let store = Arc::new(InMemoryStore::new(Arc::clone(&dyn_clock)));
        let vault = CredentialVault::new(CredentialCost::minimal()).expect("argon2 parameters");
        let signer = TokenSigner::new(
            Arc::new(JwtCodec::new(SECRET)),
            Arc::clone(&dyn_clock),
            "social",
        );
        let ledger = || {
            InvitationLedger::new(Arc::clone(&store), Arc::clone(&dyn_clock), TimeDelta::days(3))
        };
        let posts = Arc::new(PostService::new(Arc::clone(&store), Arc::clone(&dyn_clock)));

        let state = HttpState {
            registration: Arc::new(RegistrationOrchestrator::new(
                Arc::clone(&store),
                ledger(),
                Arc::new(LoggingMailSender),
                vault.clone(),
                RegistrationSettings::new("http://localhost:5173", "development"),
            )),
            activation: Arc::new(ActivationService::new(ledger())),
            tokens: Arc::new(TokenIssuanceService::new(
                Arc::clone(&store),
                vault,
                signer.clone(),
                TimeDelta::hours(1),
            )),
            sessions: Arc::new(signer),
            users: Arc::new(UserDirectory::new(Arc::clone(&store))),
            follows: Arc::new(FollowerGraph::new(Arc::clone(&store))),
            feed: Arc::new(FeedEngine::new(Arc::clone(&store))),
            posts: posts.clone(),
            posts_query: posts,
        };

        Self {
            runtime: Arc::new(Runtime::new().expect("create runtime")),
            state,
            clock,
            accounts: Arc::new(Mutex::new(HashMap::new())),
            posts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn account(&self, name: &str) -> Account {
        self.accounts
            .lock()
            .expect("accounts lock")
            .get(name)
            .cloned()
            .unwrap_or_else(|| panic!("{name} has not registered"))
    }

    fn user_id(&self, name: &str) -> UserId {
        self.account(name).id
    }

    fn post_id(&self, title: &str) -> PostId {
        *self
            .posts
            .lock()
            .expect("posts lock")
            .get(title)
            .unwrap_or_else(|| panic!("no post titled {title}"))
    }

    fn register(&self, name: &str) {
        let request = RegistrationRequest {
            username: name.to_owned(),
            email: format!("{name}@example.com"),
            password: Zeroizing::new(PASSWORD.to_owned()),
        };
        let registration = self
            .runtime
            .block_on(self.state.registration.register(request))
            .expect("registration succeeds");
        assert!(!registration.user.activation().is_active());
        self.accounts.lock().expect("accounts lock").insert(
            name.to_owned(),
            Account {
                id: registration.user.id(),
                token: registration.token,
            },
        );
    }

    fn activate(&self, name: &str) -> Result<(), Error> {
        let account = self.account(name);
        let user = self
            .runtime
            .block_on(self.state.activation.activate(&account.token))?;
        assert_eq!(user.id(), account.id);
        assert!(user.activation().is_active());
        Ok(())
    }

    fn publish(&self, author: &str, title: &str) {
        let request = CreatePostRequest {
            title: title.to_owned(),
            content: format!("{title} by {author}"),
            tags: vec![],
        };
        let post = self
            .runtime
            .block_on(self.state.posts.create(self.user_id(author), request))
            .expect("post created");
        self.posts
            .lock()
            .expect("posts lock")
            .insert(title.to_owned(), post.id);
    }
}

#[derive(Default, ScenarioState)]
struct World {
    backend: Slot<Backend>,
    last_error: Slot<Error>,
}

impl World {
    fn backend(&self) -> Backend {
        self.backend.get().expect("backend should be set")
    }

    fn record(&self, result: Result<(), Error>) {
        if let Err(err) = result {
            self.last_error.set(err);
        }
    }

    fn last_error(&self) -> Error {
        self.last_error.get().expect("a request should have failed")
    }
}

#[fixture]
fn world() -> World {
    World::default()
}

// ============================================================================
// Given steps
// ============================================================================

#[given("a fresh social backend")]
fn a_fresh_social_backend(world: &World) {
    world.backend.set(Backend::new());
}

#[given("{name} registers")]
fn given_registers(world: &World, name: String) {
    world.backend().register(&name);
}

#[given("{name} has registered and activated")]
fn has_registered_and_activated(world: &World, name: String) {
    let backend = world.backend();
    backend.register(&name);
    backend.activate(&name).expect("activation succeeds");
}

#[given("{follower} follows {followed}")]
fn follows(world: &World, follower: String, followed: String) {
    let backend = world.backend();
    backend
        .runtime
        .block_on(
            backend
                .state
                .follows
                .follow(backend.user_id(&follower), backend.user_id(&followed)),
        )
        .expect("follow succeeds");
}

#[given("{author} publishes {title}")]
fn given_publishes(world: &World, author: String, title: String) {
    world.backend().publish(&author, &title);
}

// ============================================================================
// When steps
// ============================================================================

#[when("{name} registers")]
fn when_registers(world: &World, name: String) {
    world.backend().register(&name);
}

#[when("{name} redeems the invitation")]
fn redeems_the_invitation(world: &World, name: String) {
    world.record(world.backend().activate(&name));
}

#[when("{name} redeems the invitation again")]
fn redeems_the_invitation_again(world: &World, name: String) {
    world.record(world.backend().activate(&name));
}

#[when("{name} asks for a new activation mail")]
fn asks_for_a_new_activation_mail(world: &World, name: String) {
    let backend = world.backend();
    backend
        .runtime
        .block_on(
            backend
                .state
                .registration
                .resend_invitation(&format!("{name}@example.com")),
        )
        .expect("resend accepted");
}

#[when("{days:i64} days pass")]
fn days_pass(world: &World, days: i64) {
    world.backend().clock.advance_seconds(days * 24 * 60 * 60);
}

#[when("{name} requests a session token")]
fn requests_a_session_token(world: &World, name: String) {
    let backend = world.backend();
    let credentials = LoginCredentials::try_from_parts(&format!("{name}@example.com"), PASSWORD)
        .expect("credentials are well formed");
    let result = backend
        .runtime
        .block_on(backend.state.tokens.issue(&credentials))
        .map(|_| ());
    world.record(result);
}

#[when("{author} publishes {title}")]
fn when_publishes(world: &World, author: String, title: String) {
    world.backend().publish(&author, &title);
}

#[when("{name} tries to follow {target}")]
fn tries_to_follow(world: &World, name: String, target: String) {
    let backend = world.backend();
    let result = backend.runtime.block_on(
        backend
            .state
            .follows
            .follow(backend.user_id(&name), backend.user_id(&target)),
    );
    world.record(result);
}

#[when("{name} edits {title}")]
fn edits(world: &World, name: String, title: String) {
    let backend = world.backend();
    let request = UpdatePostRequest {
        title: Some(format!("{title}, revised")),
        content: None,
    };
    let result = backend
        .runtime
        .block_on(backend.state.posts.update(
            backend.user_id(&name),
            backend.post_id(&title),
            request,
        ))
        .map(|_| ());
    world.record(result);
}

// ============================================================================
// Then steps
// ============================================================================

#[then("{name} is pending activation")]
fn is_pending_activation(world: &World, name: String) {
    let backend = world.backend();
    let user = backend
        .runtime
        .block_on(backend.state.users.fetch_user(backend.user_id(&name)))
        .expect("user exists");
    assert!(!user.activation().is_active());
}

#[then("{name} can obtain a session token that verifies as {expected}")]
fn can_obtain_a_session_token(world: &World, name: String, expected: String) {
    let backend = world.backend();
    let credentials = LoginCredentials::try_from_parts(&format!("{name}@example.com"), PASSWORD)
        .expect("credentials are well formed");
    let issued = backend
        .runtime
        .block_on(backend.state.tokens.issue(&credentials))
        .expect("token issued");
    let verified = backend
        .runtime
        .block_on(backend.state.sessions.verify(issued.token.as_str()))
        .expect("token verifies");
    assert_eq!(verified, backend.user_id(&expected));
}

#[then("the feed of {viewer} lists {title} only")]
fn the_feed_lists_only(world: &World, viewer: String, title: String) {
    let backend = world.backend();
    let page = backend
        .runtime
        .block_on(
            backend
                .state
                .feed
                .feed(backend.user_id(&viewer), &RawFeedParams::default()),
        )
        .expect("feed loads");
    let titles: Vec<&str> = page
        .entries
        .iter()
        .map(|entry| entry.post.title.as_ref())
        .collect();
    assert_eq!(titles, [title.as_str()]);
}

#[then("the request fails with code {code}")]
fn the_request_fails_with_code(world: &World, code: String) {
    let err = world.last_error();
    let detail = err
        .details()
        .and_then(|details| details.get("code"))
        .and_then(Value::as_str);
    assert_eq!(detail, Some(code.as_str()), "unexpected error: {err:?}");
}

#[then("the request fails with status {status}")]
fn the_request_fails_with_status(world: &World, status: String) {
    let expected = match status.as_str() {
        "unauthorized" => ErrorCode::Unauthorized,
        "forbidden" => ErrorCode::Forbidden,
        other => panic!("unsupported status {other}"),
    };
    assert_eq!(world.last_error().code(), expected);
}

// ============================================================================
// Scenario bindings
// ============================================================================

#[scenario(
    path = "tests/features/social_graph.feature",
    name = "A registered account activates and signs in"
)]
fn a_registered_account_activates_and_signs_in(world: World) {
    let _ = world;
}

#[scenario(
    path = "tests/features/social_graph.feature",
    name = "Invitations are single use"
)]
fn invitations_are_single_use(world: World) {
    let _ = world;
}

#[scenario(
    path = "tests/features/social_graph.feature",
    name = "Expired invitations cannot be redeemed"
)]
fn expired_invitations_cannot_be_redeemed(world: World) {
    let _ = world;
}

#[scenario(
    path = "tests/features/social_graph.feature",
    name = "A resent activation mail replaces the pending invitation"
)]
fn a_resent_activation_mail_replaces_the_pending_invitation(world: World) {
    let _ = world;
}

#[scenario(
    path = "tests/features/social_graph.feature",
    name = "Pending accounts cannot sign in"
)]
fn pending_accounts_cannot_sign_in(world: World) {
    let _ = world;
}

#[scenario(
    path = "tests/features/social_graph.feature",
    name = "The feed only shows followed authors"
)]
fn the_feed_only_shows_followed_authors(world: World) {
    let _ = world;
}

#[scenario(
    path = "tests/features/social_graph.feature",
    name = "Users cannot follow themselves"
)]
fn users_cannot_follow_themselves(world: World) {
    let _ = world;
}

#[scenario(
    path = "tests/features/social_graph.feature",
    name = "Only the author may edit a post"
)]
fn only_the_author_may_edit_a_post(world: World) {
    let _ = world;
}
