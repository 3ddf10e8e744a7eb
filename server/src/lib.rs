//! Web front end: the live attendance dashboard and the exam blueprint generator.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use librollcall::blueprint::{BLUEPRINT_FILE_NAME, MAPPING_FILE_NAME};
use tower_http::trace::TraceLayer;

pub use self::error::AppError;
pub use self::state::AppState;

mod error;
mod routes;
mod state;
mod templates;

/// Seconds between automatic reloads of the dashboard page.
pub const REFRESH_SECS: u64 = 10;

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::attendance::dashboard))
        .route("/refresh", post(routes::attendance::refresh))
        .route("/api/attendance", get(routes::attendance::report_json))
        .route("/blueprint", get(routes::blueprint::page))
        .route(
            &format!("/blueprint/{BLUEPRINT_FILE_NAME}"),
            get(routes::blueprint::summary_csv),
        )
        .route(
            &format!("/blueprint/{MAPPING_FILE_NAME}"),
            get(routes::blueprint::mapping_csv),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
