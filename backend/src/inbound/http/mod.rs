//! HTTP inbound adapter exposing the reputation REST endpoints.

use actix_web::web;

pub mod error;
pub mod events;
pub mod health;
pub mod members;
pub mod notifications;
pub mod scores;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::{ApiError, ApiResult, ErrorCode};

/// Register every `/api/v1` handler plus extractor error handling on a
/// scope or app.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _| error::extractor_error(err)))
        .app_data(web::PathConfig::default().error_handler(|err, _| error::extractor_error(err)))
        .app_data(web::QueryConfig::default().error_handler(|err, _| error::extractor_error(err)))
        .service(members::register_member)
        .service(events::dispatch_event)
        .service(scores::get_score)
        .service(scores::get_activity)
        .service(scores::take_rank_up)
        .service(scores::get_leaderboard)
        .service(notifications::list_notifications)
        .service(notifications::unread_count)
        .service(notifications::stream_notifications)
        .service(notifications::mark_all_read)
        .service(notifications::mark_read);
}
