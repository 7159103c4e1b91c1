use axum::extract::{Path, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::time::Instant;
use tracing::{error, info, warn};
use crate::client_key::ClientKey;
use crate::error::GatewayError;
use crate::metrics::{GENERATION_FAILURES, GENERATION_LATENCY, RATE_LIMITED, REQUEST_TOTAL};
use crate::state::AppState;

#[derive(Debug, Clone, Copy)]
enum MediaKind {
    Clip,
    Preview,
}

impl MediaKind {
    fn content_type(self) -> &'static str {
        match self {
            MediaKind::Clip => "video/mp4",
            MediaKind::Preview => "image/jpg",
        }
    }

    fn label(self) -> &'static str {
        match self {
            MediaKind::Clip => "clip",
            MediaKind::Preview => "preview",
        }
    }
}

// channel comes percent-decoded from the wildcard, slashes included
pub async fn clip_handler(
    State(state): State<AppState>,
    ClientKey(key): ClientKey,
    Path(channel): Path<String>,
) -> Result<Response, GatewayError> {
    serve_media(&state, &key, &channel, MediaKind::Clip).await
}

pub async fn preview_handler(
    State(state): State<AppState>,
    ClientKey(key): ClientKey,
    Path(channel): Path<String>,
) -> Result<Response, GatewayError> {
    serve_media(&state, &key, &channel, MediaKind::Preview).await
}

// bare "/clip/" and "/preview/": still counted against the quota, then rejected
pub async fn clip_index_handler(
    State(state): State<AppState>,
    ClientKey(key): ClientKey,
) -> Result<Response, GatewayError> {
    serve_media(&state, &key, "", MediaKind::Clip).await
}

pub async fn preview_index_handler(
    State(state): State<AppState>,
    ClientKey(key): ClientKey,
) -> Result<Response, GatewayError> {
    serve_media(&state, &key, "", MediaKind::Preview).await
}

// "/clip" -> "/clip/", not rate limited
pub async fn clip_redirect() -> impl IntoResponse {
    (StatusCode::MOVED_PERMANENTLY, [(LOCATION, "/clip/")])
}

pub async fn preview_redirect() -> impl IntoResponse {
    (StatusCode::MOVED_PERMANENTLY, [(LOCATION, "/preview/")])
}

async fn serve_media(
    state: &AppState,
    key: &str,
    channel: &str,
    kind: MediaKind,
) -> Result<Response, GatewayError> {
    REQUEST_TOTAL.inc();

    // quota is checked before anything else, bad requests still count
    if !state.limiter.allow(key) {
        RATE_LIMITED.inc();
        warn!(client = %key, "Rate limit exceeded");
        return Err(GatewayError::RateLimited);
    }

    let channel = channel.to_lowercase();
    info!(kind = kind.label(), %channel, "Media requested");
    if channel.is_empty() {
        return Err(GatewayError::InvalidChannel);
    }

    let start_time = Instant::now();
    let result = match kind {
        MediaKind::Clip => state.generator.make_clip(&channel).await,
        MediaKind::Preview => state.generator.make_preview(&channel).await,
    };
    GENERATION_LATENCY.observe(start_time.elapsed().as_secs_f64());

    let data = result.inspect_err(|e| {
        GENERATION_FAILURES.inc();
        error!(kind = kind.label(), %channel, error = %e, "Media generation failed");
    })?;

    let headers = [
        (CONTENT_TYPE, HeaderValue::from_static(kind.content_type())),
        (CONTENT_LENGTH, HeaderValue::from(data.len())),
    ];
    Ok((headers, data).into_response())
}
