use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use crate::metrics::TRACKED_VISITORS;
use crate::rate_limit::RateLimiter;

// Background sweep that drops clients who went idle.
// Per-request pruning only touches keys that keep calling, so without this
// a key that bursts once and disappears would stay in the table forever.
pub fn spawn_janitor(
    limiter: Arc<RateLimiter>,
    every: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_secs = every.as_secs(), "Visitor janitor started");

        // first sweep after one full interval, not at startup
        let mut ticker = interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = limiter.sweep();
                    let tracked = limiter.tracked();
                    TRACKED_VISITORS.set(tracked as f64);
                    debug!(removed, tracked, "Visitor table swept");
                }
                _ = shutdown.cancelled() => {
                    info!("Visitor janitor shutting down");
                    break;
                }
            }
        }
    })
}
