//! Builders for HTTP state ports backed by either PostgreSQL or the
//! in-memory store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::TimeDelta;
use color_eyre::eyre::{Result, WrapErr, bail, eyre};
use mockable::{Clock, DefaultClock};
use rand::RngCore;
use reqwest::Url;
use tracing::{info, warn};
use zeroize::Zeroizing;

use social_backend::domain::ports::{
    DeliveryStatus, FeedRepository, FollowRepository, InvitationRepository, MailDeliveryError,
    MailMessage, MailSender, PostRepository, StoreProbe, UserRepository,
};
use social_backend::domain::{
    ActivationService, CredentialVault, Deadline, Email, FeedEngine, FollowerGraph,
    InvitationLedger, PostService, RegistrationOrchestrator, RegistrationSettings,
    TokenIssuanceService, TokenSigner, UserDirectory,
};
use social_backend::inbound::http::state::HttpState;
use social_backend::outbound::mail::{HttpMailConfig, HttpMailSender, LoggingMailSender};
use social_backend::outbound::memory::InMemoryStore;
use social_backend::outbound::persistence::{
    DbPool, DieselFeedRepository, DieselFollowRepository, DieselInvitationRepository,
    DieselPostRepository, DieselUserRepository, PoolConfig, run_pending_migrations,
};
use social_backend::outbound::token::{JwtCodec, MIN_SECRET_BYTES};

use super::AppSettings;

/// Ports handed to the HTTP server.
pub(crate) struct BuiltState {
    pub(crate) http: HttpState,
    pub(crate) store: Arc<dyn StoreProbe>,
}

/// Mail adapter selected at startup.
enum ConfiguredMailer {
    Http(HttpMailSender),
    Logging(LoggingMailSender),
}

#[async_trait]
impl MailSender for ConfiguredMailer {
    async fn send(&self, message: &MailMessage) -> Result<DeliveryStatus, MailDeliveryError> {
        match self {
            Self::Http(sender) => sender.send(message).await,
            Self::Logging(sender) => sender.send(message).await,
        }
    }
}

fn build_mailer(settings: &AppSettings) -> Result<ConfiguredMailer> {
    let Some(api_key) = settings.mail_api_key() else {
        if settings.is_production() {
            warn!("no mail provider configured; activation mail will only be logged");
        }
        return Ok(ConfiguredMailer::Logging(LoggingMailSender));
    };
    let endpoint = settings
        .mail_api_url()
        .ok_or_else(|| eyre!("mail_api_url is required when mail_api_key is set"))?;
    let url = Url::parse(endpoint).wrap_err("mail_api_url is not a valid URL")?;
    let from_address = Email::new(settings.mail_from_address())
        .map_err(|err| eyre!("mail_from_address is invalid: {err}"))?;
    let sender = HttpMailSender::new(HttpMailConfig::new(
        url,
        api_key,
        from_address,
        settings.mail_from_name(),
    ))
    .wrap_err("failed to build mail client")?;
    Ok(ConfiguredMailer::Http(sender))
}

/// Resolve the token signing secret.
///
/// Production refuses to start without one. Elsewhere a random secret is
/// generated, so tokens stop verifying after a restart.
fn resolve_token_secret(settings: &AppSettings) -> Result<Zeroizing<Vec<u8>>> {
    match settings.token_secret() {
        Some(secret) => {
            if secret.len() < MIN_SECRET_BYTES {
                warn!(
                    min_bytes = MIN_SECRET_BYTES,
                    "token secret is shorter than recommended"
                );
            }
            Ok(Zeroizing::new(secret.as_bytes().to_vec()))
        }
        None if settings.is_production() => {
            bail!("token_secret must be set in production")
        }
        None => {
            warn!("no token secret configured; using an ephemeral secret (dev only)");
            let mut secret = Zeroizing::new(vec![0_u8; MIN_SECRET_BYTES]);
            rand::thread_rng().fill_bytes(secret.as_mut_slice());
            Ok(secret)
        }
    }
}

/// Repository adapters for one backing store.
struct Repositories<U, I, F, Q, P> {
    users: Arc<U>,
    invitations: Arc<I>,
    follows: Arc<F>,
    feed: Arc<Q>,
    posts: Arc<P>,
}

impl Repositories<InMemoryStore, InMemoryStore, InMemoryStore, InMemoryStore, InMemoryStore> {
    fn in_memory(store: &Arc<InMemoryStore>) -> Self {
        Self {
            users: Arc::clone(store),
            invitations: Arc::clone(store),
            follows: Arc::clone(store),
            feed: Arc::clone(store),
            posts: Arc::clone(store),
        }
    }
}

impl
    Repositories<
        DieselUserRepository,
        DieselInvitationRepository,
        DieselFollowRepository,
        DieselFeedRepository,
        DieselPostRepository,
    >
{
    fn diesel(pool: &DbPool) -> Self {
        Self {
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            invitations: Arc::new(DieselInvitationRepository::new(pool.clone())),
            follows: Arc::new(DieselFollowRepository::new(pool.clone())),
            feed: Arc::new(DieselFeedRepository::new(pool.clone())),
            posts: Arc::new(DieselPostRepository::new(pool.clone())),
        }
    }
}

/// Store-independent collaborators shared by every service.
struct Wiring {
    clock: Arc<dyn Clock>,
    deadline: Deadline,
    vault: CredentialVault,
    signer: TokenSigner,
    mailer: Arc<ConfiguredMailer>,
    registration: RegistrationSettings,
    token_ttl: TimeDelta,
    invitation_ttl: TimeDelta,
    feed_max_limit: u32,
}

impl Wiring {
    fn from_settings(settings: &AppSettings, clock: Arc<dyn Clock>) -> Result<Self> {
        let vault = CredentialVault::new(settings.credential_cost())
            .map_err(|err| eyre!("invalid argon2 parameters: {err}"))?;
        let secret = resolve_token_secret(settings)?;
        let codec = Arc::new(JwtCodec::new(secret.to_vec()));
        let signer = TokenSigner::new(codec, Arc::clone(&clock), settings.token_issuer());
        Ok(Self {
            clock,
            deadline: Deadline::new(settings.store_timeout()?),
            vault,
            signer,
            mailer: Arc::new(build_mailer(settings)?),
            registration: RegistrationSettings::new(
                settings.frontend_url(),
                settings.environment(),
            ),
            token_ttl: settings.token_ttl()?,
            invitation_ttl: settings.invitation_ttl()?,
            feed_max_limit: settings.feed_max_limit(),
        })
    }

    fn assemble<U, I, F, Q, P>(self, repos: Repositories<U, I, F, Q, P>) -> HttpState
    where
        U: UserRepository + 'static,
        I: InvitationRepository + 'static,
        F: FollowRepository + 'static,
        Q: FeedRepository + 'static,
        P: PostRepository + 'static,
    {
        let Self {
            clock,
            deadline,
            vault,
            signer,
            mailer,
            registration,
            token_ttl,
            invitation_ttl,
            feed_max_limit,
        } = self;
        let ledger = || {
            InvitationLedger::new(
                Arc::clone(&repos.invitations),
                Arc::clone(&clock),
                invitation_ttl,
            )
            .with_deadline(deadline)
        };
        let posts =
            Arc::new(PostService::new(repos.posts, Arc::clone(&clock)).with_deadline(deadline));

        HttpState {
            registration: Arc::new(
                RegistrationOrchestrator::new(
                    Arc::clone(&repos.users),
                    ledger(),
                    mailer,
                    vault.clone(),
                    registration,
                )
                .with_deadline(deadline),
            ),
            activation: Arc::new(ActivationService::new(ledger()).with_deadline(deadline)),
            tokens: Arc::new(
                TokenIssuanceService::new(
                    Arc::clone(&repos.users),
                    vault,
                    signer.clone(),
                    token_ttl,
                )
                .with_deadline(deadline),
            ),
            sessions: Arc::new(signer),
            users: Arc::new(UserDirectory::new(repos.users).with_deadline(deadline)),
            follows: Arc::new(FollowerGraph::new(repos.follows).with_deadline(deadline)),
            feed: Arc::new(
                FeedEngine::new(repos.feed)
                    .with_max_limit(feed_max_limit)
                    .with_deadline(deadline),
            ),
            posts: posts.clone(),
            posts_query: posts,
        }
    }
}

/// Build the HTTP state, migrating and connecting to PostgreSQL when a
/// database URL is configured and falling back to the in-memory store
/// otherwise.
///
/// # Errors
/// Fails on invalid settings, migration failures or an unreachable pool.
pub(crate) async fn build_state(settings: &AppSettings) -> Result<BuiltState> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let wiring = Wiring::from_settings(settings, Arc::clone(&clock))?;

    let Some(database_url) = settings.database_url() else {
        warn!("no database configured; records live in memory and vanish on restart");
        let store = Arc::new(InMemoryStore::new(clock));
        let http = wiring.assemble(Repositories::in_memory(&store));
        return Ok(BuiltState { http, store });
    };

    run_pending_migrations(database_url)
        .await
        .wrap_err("database migrations failed")?;
    let pool = DbPool::connect(
        &PoolConfig::new(database_url).with_acquire_timeout(settings.store_timeout()?),
    )
    .await
    .wrap_err("failed to build the connection pool")?;
    info!("connected to PostgreSQL");
    let http = wiring.assemble(Repositories::diesel(&pool));
    Ok(BuiltState {
        http,
        store: Arc::new(pool),
    })
}
