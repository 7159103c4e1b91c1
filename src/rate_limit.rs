use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;
use crate::bypass::BypassList;

// Sliding window rate limiter - tracks admitted request times per client key.
//
// A key gets at most `limit` admissions in any trailing `window`. Records
// only hold timestamps inside the window and empty records are never kept.
pub struct RateLimiter {
    visitors: DashMap<String, Vec<Instant>>,
    bypass: BypassList,
    limit: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(limit: usize, window: Duration, bypass: BypassList) -> Self {
        Self {
            visitors: DashMap::new(),
            bypass,
            limit: limit.max(1),
            window,
        }
    }

    // true if the request may go ahead
    pub fn allow(&self, key: &str) -> bool {
        self.allow_with(key, Instant::now)
    }

    pub fn allow_at(&self, key: &str, now: Instant) -> bool {
        self.allow_with(key, || now)
    }

    // The clock is read only once the shard lock is held, so two callers
    // for the same key always append in time order.
    fn allow_with(&self, key: &str, clock: impl FnOnce() -> Instant) -> bool {
        if self.bypass.is_bypassed(key) {
            return true;
        }

        let mut record = self.visitors.entry(key.to_string()).or_default();
        let now = clock();
        prune(record.value_mut(), self.cutoff(now));

        // pruned record stays written back even when denied
        if record.len() >= self.limit {
            return false;
        }

        record.push(now);
        true
    }

    /// Prune every record against the current window and drop keys that
    /// have nothing left. Returns how many keys were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let cutoff = self.cutoff(now);
        let before = self.visitors.len();

        self.visitors.retain(|_, record| {
            prune(record, cutoff);
            !record.is_empty()
        });

        before.saturating_sub(self.visitors.len())
    }

    // number of keys currently tracked
    pub fn tracked(&self) -> usize {
        self.visitors.len()
    }

    #[cfg(test)]
    pub fn is_tracked(&self, key: &str) -> bool {
        self.visitors.contains_key(key)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    // None this early in the clock means nothing can be stale yet
    fn cutoff(&self, now: Instant) -> Option<Instant> {
        now.checked_sub(self.window)
    }
}

// Drop timestamps strictly before the cutoff. Records are sorted, so the
// stale ones are always a prefix.
fn prune(record: &mut Vec<Instant>, cutoff: Option<Instant>) {
    let Some(cutoff) = cutoff else {
        return;
    };
    let stale = record.partition_point(|t| *t < cutoff);
    record.drain(..stale);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(bypass: &str) -> RateLimiter {
        RateLimiter::new(3, Duration::from_secs(15), BypassList::load(bypass))
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn admits_up_to_limit_then_recovers_after_window() {
        let rl = limiter("");
        let t0 = Instant::now();

        assert!(rl.allow_at("A", t0));
        assert!(rl.allow_at("A", t0 + secs(1)));
        assert!(rl.allow_at("A", t0 + secs(2)));
        assert!(!rl.allow_at("A", t0 + secs(3)));
        // t=0 is outside the window now
        assert!(rl.allow_at("A", t0 + secs(16)));
    }

    #[test]
    fn timestamp_equal_to_cutoff_still_counts() {
        let rl = limiter("");
        let t0 = Instant::now();

        assert!(rl.allow_at("A", t0));
        assert!(rl.allow_at("A", t0));
        assert!(rl.allow_at("A", t0));
        assert!(!rl.allow_at("A", t0 + secs(15)));
        assert!(rl.allow_at("A", t0 + secs(15) + Duration::from_millis(1)));
    }

    #[test]
    fn never_more_than_limit_in_any_window() {
        let rl = limiter("");
        let t0 = Instant::now();
        let mut admitted = Vec::new();

        // one call every 250ms for two minutes
        for i in 0..480u64 {
            let now = t0 + Duration::from_millis(i * 250);
            if rl.allow_at("A", now) {
                admitted.push(now);
            }
        }

        for (i, start) in admitted.iter().enumerate() {
            let in_window = admitted[i..]
                .iter()
                .take_while(|t| t.duration_since(*start) < secs(15))
                .count();
            assert!(in_window <= 3, "{in_window} admissions inside one window");
        }
        // no burst doubling at boundaries: 120s / 15s * 3
        assert!(admitted.len() <= 27);
    }

    #[test]
    fn denied_calls_prune_stale_entries() {
        let rl = limiter("");
        let t0 = Instant::now();

        for i in 0..3 {
            assert!(rl.allow_at("A", t0 + secs(i)));
        }
        assert!(!rl.allow_at("A", t0 + secs(10)));
        assert!(!rl.allow_at("A", t0 + secs(15)));
        // t=0 and t=1 have aged out, t=2 is still inside
        assert!(rl.allow_at("A", t0 + secs(17)));
        assert!(rl.allow_at("A", t0 + secs(17)));
        assert!(!rl.allow_at("A", t0 + secs(17)));
    }

    #[test]
    fn keys_are_independent() {
        let rl = limiter("");
        let t0 = Instant::now();

        for _ in 0..3 {
            assert!(rl.allow_at("A", t0));
        }
        assert!(!rl.allow_at("A", t0));
        assert!(rl.allow_at("C", t0));
        assert_eq!(rl.tracked(), 2);
    }

    #[test]
    fn bypassed_key_is_always_admitted_and_never_stored() {
        let rl = limiter("B, 10.0.0.9");
        let t0 = Instant::now();

        for i in 0..10u64 {
            assert!(rl.allow_at("B", t0 + Duration::from_millis(i * 100)));
        }
        assert!(!rl.is_tracked("B"));
        assert_eq!(rl.tracked(), 0);
    }

    #[test]
    fn sweep_removes_idle_keys_only() {
        let rl = limiter("");
        let t0 = Instant::now();

        for _ in 0..5 {
            rl.allow_at("idle", t0);
        }
        rl.allow_at("busy", t0 + secs(50));

        let removed = rl.sweep_at(t0 + secs(60));
        assert_eq!(removed, 1);
        assert!(!rl.is_tracked("idle"));
        assert!(rl.is_tracked("busy"));
    }

    #[test]
    fn sweep_keeps_partial_records() {
        let rl = limiter("");
        let t0 = Instant::now();

        rl.allow_at("A", t0);
        rl.allow_at("A", t0 + secs(10));
        assert_eq!(rl.sweep_at(t0 + secs(20)), 0);

        // only the t=10 entry survived, so two more fit
        assert!(rl.allow_at("A", t0 + secs(20)));
        assert!(rl.allow_at("A", t0 + secs(20)));
        assert!(!rl.allow_at("A", t0 + secs(20)));
    }

    #[test]
    fn zero_limit_is_clamped_to_one() {
        let rl = RateLimiter::new(0, secs(15), BypassList::default());
        assert_eq!(rl.limit(), 1);
        assert!(rl.allow("A"));
        assert!(!rl.allow("A"));
    }

    #[test]
    fn prune_drops_only_the_stale_prefix() {
        let t0 = Instant::now();
        let mut record = vec![t0, t0 + secs(1), t0 + secs(2), t0 + secs(2)];

        prune(&mut record, Some(t0 + secs(2)));
        assert_eq!(record, vec![t0 + secs(2), t0 + secs(2)]);

        prune(&mut record, None);
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn clock_is_read_under_the_key_lock() {
        let rl = limiter("");
        let t0 = Instant::now();

        assert!(rl.allow_with("A", || {
            assert!(rl.visitors.try_get("A").is_locked());
            t0
        }));
    }

    #[test]
    fn concurrent_callers_keep_records_sorted() {
        use std::sync::Arc;

        let rl = Arc::new(RateLimiter::new(usize::MAX, secs(3600), BypassList::default()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let rl = Arc::clone(&rl);
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        assert!(rl.allow("shared"));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let record = rl.visitors.get("shared").unwrap();
        assert_eq!(record.len(), 1600);
        assert!(record.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn concurrent_callers_share_one_quota() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let rl = Arc::new(RateLimiter::new(3, secs(3600), BypassList::default()));
        let admitted = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let rl = Arc::clone(&rl);
                let admitted = Arc::clone(&admitted);
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        if rl.allow("shared") {
                            admitted.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(admitted.load(Ordering::Relaxed), 3);
    }
}
