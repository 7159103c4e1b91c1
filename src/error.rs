use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("rate limit exceeded")]
    RateLimited,

    #[error("invalid channel name")]
    InvalidChannel,

    #[error("generator returned {status} for {channel}")]
    UpstreamStatus { channel: String, status: StatusCode },

    #[error("generator request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::InvalidChannel => StatusCode::BAD_REQUEST,
            GatewayError::UpstreamStatus { .. }
            | GatewayError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// {"message": "...", "error": 429}
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub error: u16,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            message: self.to_string(),
            error: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}
