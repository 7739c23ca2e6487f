//! HTTP inbound adapter exposing REST endpoints.

pub mod error;
pub mod health;
pub mod history;
pub mod idempotency;
pub mod segments;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod user_segments;
pub mod users;
pub mod validation;

pub use error::ApiResult;

use actix_web::web;

/// Register the `/api/v1` scope and the extractor error handlers.
///
/// Callers provide `web::Data<HttpState>` on the enclosing app.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(error::query_error_handler))
        .service(
            web::scope("/api/v1")
                .service(user_segments::change_user_segments)
                .service(user_segments::get_user_segments)
                .service(segments::create_segment)
                .service(segments::delete_segment)
                .service(users::create_user)
                .service(history::list_history),
        );
}
