//! Seed a PostgreSQL database with deterministic example data.
//!
//! Reads `EXAMPLE_DATA_*` settings, applies pending migrations, then
//! registers, activates and connects the generated accounts through the
//! domain services. With `EXAMPLE_DATA_DRY_RUN=true` the dataset is only
//! generated and summarised.

use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr, eyre};
use example_data::SeedRegistry;
use mockable::{Clock, DefaultClock};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use social_backend::domain::{CredentialCost, CredentialVault};
use social_backend::example_data::{
    ExampleDataSeeder, ExampleDataSettings, SeedPorts, SeedSelection, SeedTarget, SeedingResult,
    plan_dataset,
};
use social_backend::outbound::persistence::{
    DbPool, DieselFollowRepository, DieselInvitationRepository, DieselPostRepository,
    DieselUserRepository, PoolConfig, run_pending_migrations,
};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt().with_env_filter(EnvFilter::from_default_env()).try_init() {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ExampleDataSettings::load_from_iter(std::env::args_os())
        .wrap_err("failed to load configuration")?;
    let selection = settings.selection()?;
    let registry_path = settings.registry_path();
    let registry = SeedRegistry::from_file(&registry_path)
        .wrap_err_with(|| format!("failed to load {}", registry_path.display()))?;

    match settings.target()? {
        SeedTarget::DryRun => summarise(&registry, &selection),
        SeedTarget::Database(url) => seed_database(url, &registry, &selection).await,
    }
}

fn summarise(registry: &SeedRegistry, selection: &SeedSelection) -> Result<()> {
    let dataset = plan_dataset(registry, selection)?;
    info!(
        seed = %selection.name,
        users = dataset.users.len(),
        posts = dataset.posts.len(),
        comments = dataset.comment_count(),
        follows = dataset.follows.len(),
        likes = dataset.likes.len(),
        "dry run generated example data"
    );
    Ok(())
}

async fn seed_database(
    database_url: &str,
    registry: &SeedRegistry,
    selection: &SeedSelection,
) -> Result<()> {
    run_pending_migrations(database_url)
        .await
        .wrap_err("database migrations failed")?;
    let pool = DbPool::connect(&PoolConfig::new(database_url))
        .await
        .wrap_err("failed to build the connection pool")?;

    let vault = CredentialVault::new(CredentialCost::default())
        .map_err(|err| eyre!("invalid argon2 parameters: {err}"))?;
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let seeder = ExampleDataSeeder::new(SeedPorts::over(
        Arc::new(DieselUserRepository::new(pool.clone())),
        Arc::new(DieselInvitationRepository::new(pool.clone())),
        Arc::new(DieselFollowRepository::new(pool.clone())),
        Arc::new(DieselPostRepository::new(pool)),
        vault,
        clock,
    ));

    let outcome = seeder.seed_from_registry(registry, selection).await?;
    if outcome.result == SeedingResult::AlreadySeeded {
        info!(seed_key = %outcome.seed_key, "database already holds this seed");
    }
    Ok(())
}
