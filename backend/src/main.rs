//! Backend entry-point: loads settings, wires adapters and serves the API.

mod server;

use std::time::Duration;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use reputation::ReputationSettings;
use reputation::inbound::http::health::HealthState;
use reputation::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use server::{ServerConfig, create_server};

const POOL_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings =
        ReputationSettings::load().map_err(|err| std::io::Error::other(err.to_string()))?;
    let bind_addr = settings.bind_addr().map_err(std::io::Error::other)?;
    let rank_table = settings.rank_table().map_err(std::io::Error::other)?;
    let service = settings.service_config().map_err(std::io::Error::other)?;

    let mut config = ServerConfig::new(bind_addr, rank_table, service)
        .with_feed_capacity(settings.feed_capacity());
    match settings.database_url() {
        Some(url) => {
            run_pending_migrations(url)
                .await
                .map_err(std::io::Error::other)?;
            let pool = DbPool::new(
                PoolConfig::new(url)
                    .with_max_size(settings.pool_max_size())
                    .with_connection_timeout(POOL_CONNECTION_TIMEOUT),
            )
            .await
            .map_err(std::io::Error::other)?;
            config = config.with_db_pool(pool);
            info!("using PostgreSQL adapters");
        }
        None => warn!("no database_url configured; state is held in memory only"),
    }

    let health_state = web::Data::new(HealthState::new());
    info!(%bind_addr, "starting reputation server");
    create_server(health_state, config)?.await
}
