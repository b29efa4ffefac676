//! Builders wiring driven adapters into the reputation service.

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;

use reputation::domain::ports::{
    NotificationFeed, NotificationPublisher, NotificationRepository, ScoreRepository,
    UserDirectory,
};
use reputation::domain::{ReputationAdapters, ReputationService};
use reputation::inbound::http::state::HttpState;
use reputation::outbound::memory::{
    InMemoryNotificationRepository, InMemoryScoreRepository, InMemoryUserDirectory,
};
use reputation::outbound::persistence::{
    DieselNotificationRepository, DieselScoreRepository, DieselUserDirectory,
};
use reputation::outbound::push::BroadcastNotificationPublisher;

use super::ServerConfig;

/// Assemble the service over `scores`, `notifications` and `directory`,
/// sharing one broadcast publisher between delivery and the live feed.
fn build_with_adapters<S, N, D>(
    config: &ServerConfig,
    scores: S,
    notifications: N,
    directory: D,
) -> HttpState
where
    S: ScoreRepository + 'static,
    N: NotificationRepository + 'static,
    D: UserDirectory + 'static,
{
    let broadcast = Arc::new(BroadcastNotificationPublisher::new(config.feed_capacity));
    let publisher: Arc<dyn NotificationPublisher> = broadcast.clone();
    let feed: Arc<dyn NotificationFeed> = broadcast;

    let service = ReputationService::new(
        ReputationAdapters {
            scores: Arc::new(scores),
            notifications: Arc::new(notifications),
            directory: Arc::new(directory),
            publisher,
            clock: Arc::new(DefaultClock),
        },
        Arc::clone(&config.rank_table),
        config.service,
    );
    HttpState::from_service(Arc::new(service), feed)
}

/// Build HTTP state on the Diesel adapters when a pool is configured,
/// otherwise on the in-memory adapters.
pub fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let state = match &config.db_pool {
        Some(pool) => build_with_adapters(
            config,
            DieselScoreRepository::new(pool.clone()),
            DieselNotificationRepository::new(pool.clone()),
            DieselUserDirectory::new(pool.clone()),
        ),
        None => build_with_adapters(
            config,
            InMemoryScoreRepository::new(),
            InMemoryNotificationRepository::new(),
            InMemoryUserDirectory::new(),
        ),
    };
    web::Data::new(state)
}
