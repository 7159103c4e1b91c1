mod health;
mod metrics;
mod media;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use media::{
    clip_handler, clip_index_handler, clip_redirect, preview_handler, preview_index_handler,
    preview_redirect,
};

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;
use crate::state::AppState;

// everything after /clip/ or /preview/ is the channel name; the bare
// prefix gets its own handler and the slashless form redirects to it
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/clip", get(clip_redirect))
        .route("/clip/", get(clip_index_handler))
        .route("/clip/{*channel}", get(clip_handler))
        .route("/preview", get(preview_redirect))
        .route("/preview/", get(preview_index_handler))
        .route("/preview/{*channel}", get(preview_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
