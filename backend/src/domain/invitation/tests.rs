//! Ledger behaviour against a mocked store.

use super::*;
use crate::domain::ports::MockInvitationRepository;
use crate::domain::{ActivationState, Email, PasswordHash, UserRecord, Username};
use crate::test_support::clock::MutableClock;
use rstest::rstest;

const NOW: i64 = 1_700_000_000;

fn ledger(repo: MockInvitationRepository) -> InvitationLedger<MockInvitationRepository> {
    InvitationLedger::new(
        Arc::new(repo),
        Arc::new(MutableClock::at_timestamp(NOW)),
        TimeDelta::seconds(DEFAULT_INVITATION_TTL_SECS),
    )
}

fn pending_user() -> User {
    User::from(UserRecord {
        id: UserId::new(5),
        username: Username::new("grace").expect("username"),
        email: Email::new("grace@example.com").expect("email"),
        password_hash: PasswordHash::from_phc("$argon2id$stub"),
        activation: ActivationState::Pending,
        created_at: DateTime::UNIX_EPOCH,
    })
}

#[rstest]
fn generated_tokens_are_hex_and_unique() {
    let first = InvitationToken::generate();
    let second = InvitationToken::generate();
    assert_eq!(first.expose().len(), TOKEN_BYTES * 2);
    assert!(first.expose().chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(first, second);
}

#[rstest]
fn digest_matches_known_sha256() {
    let token = InvitationToken::from_presented("abc");
    assert_eq!(
        token.digest().as_str(),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[rstest]
fn debug_output_hides_plaintext() {
    let token = InvitationToken::from_presented("deadbeef");
    assert!(!format!("{token:?}").contains("deadbeef"));
}

#[rstest]
fn mint_sets_expiry_from_the_clock() {
    let minted = ledger(MockInvitationRepository::new()).mint();
    assert_eq!(minted.entry.digest, minted.token.digest());
    assert_eq!(
        minted.entry.expires_at.timestamp(),
        NOW + DEFAULT_INVITATION_TTL_SECS
    );
}

#[rstest]
fn huge_lifetimes_saturate_instead_of_overflowing() {
    let ledger = InvitationLedger::new(
        Arc::new(MockInvitationRepository::new()),
        Arc::new(MutableClock::at_timestamp(NOW)),
        TimeDelta::MAX,
    );
    assert_eq!(ledger.mint().entry.expires_at, DateTime::<Utc>::MAX_UTC);
}

#[rstest]
#[tokio::test]
async fn issue_persists_only_the_digest() {
    let mut repo = MockInvitationRepository::new();
    repo.expect_create()
        .withf(|user, entry| *user == UserId::new(5) && entry.digest.as_str().len() == 64)
        .times(1)
        .return_once(|_, _| Ok(()));

    let token = ledger(repo).issue(UserId::new(5)).await.expect("issued");
    assert_eq!(token.expose().len(), 64);
}

#[rstest]
#[tokio::test]
async fn resolve_looks_up_by_digest_at_the_current_instant() {
    let token = InvitationToken::from_presented("feedface");
    let expected_digest = token.digest();
    let mut repo = MockInvitationRepository::new();
    repo.expect_redeem()
        .withf(move |digest, now| *digest == expected_digest && now.timestamp() == NOW)
        .times(1)
        .return_once(|_, _| Ok(InvitationLookup::Consumed(pending_user())));

    let user = ledger(repo).resolve(&token).await.expect("resolved");
    assert_eq!(user.id(), UserId::new(5));
}

#[rstest]
#[case(InvitationLookup::Missing, InvitationError::NotFound)]
#[case(InvitationLookup::Expired, InvitationError::Expired)]
#[tokio::test]
async fn resolve_classifies_misses(
    #[case] lookup: InvitationLookup,
    #[case] expected: InvitationError,
) {
    let mut repo = MockInvitationRepository::new();
    repo.expect_redeem().return_once(move |_, _| Ok(lookup));

    let err = ledger(repo)
        .resolve(&InvitationToken::from_presented("x"))
        .await
        .expect_err("miss");
    assert_eq!(err, expected);
}

#[rstest]
#[tokio::test]
async fn store_failures_propagate() {
    let mut repo = MockInvitationRepository::new();
    repo.expect_redeem()
        .return_once(|_, _| Err(InvitationPersistenceError::query("boom")));

    let err = ledger(repo)
        .resolve(&InvitationToken::from_presented("x"))
        .await
        .expect_err("store failure");
    assert_eq!(
        err,
        InvitationError::Store(InvitationPersistenceError::query("boom"))
    );
}
