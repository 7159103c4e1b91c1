use std::sync::Arc;
use crate::generator::MediaGenerator;
use crate::rate_limit::RateLimiter;
// app's shared state

#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<RateLimiter>,          // one quota per client, shared by clip + preview
    pub generator: Arc<dyn MediaGenerator>, // produces the actual media
}
