//! Backend entry-point: loads settings, wires adapters and serves the REST API.

mod server;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use social_backend::inbound::http::health::HealthState;

use server::{AppSettings, build_state, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .wrap_err("failed to load configuration")?;
    let bind_addr = settings
        .bind_addr()
        .wrap_err("bind_addr is not a valid socket address")?;
    let built = build_state(&settings).await?;

    let health_state = web::Data::new(HealthState::new().with_store_probe(built.store));
    let server = create_server(health_state, built.http, bind_addr)
        .wrap_err_with(|| format!("failed to bind {bind_addr}"))?;
    info!(%bind_addr, environment = settings.environment(), "server listening");
    server.await.wrap_err("server terminated with an error")
}
