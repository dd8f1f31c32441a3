/// Per-IP token-bucket rate limiting, generalizing the refill/consume shape
/// of the pack's `TokenBucketState` (capacity in tokens, continuous refill
/// proportional to elapsed time) down to the single in-process case this
/// service needs — no distributed storage backend, no adaptive policies.
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Bucket {
    tokens: f64,
    capacity: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl Bucket {
    fn new(capacity: f64, refill_per_sec: f64) -> Self {
        Self {
            tokens: capacity,
            capacity,
            refill_per_sec,
            last_refill: Instant::now(),
        }
    }

    fn try_consume(&mut self) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Limits requests from a single IP to `limit_per_min`, refilling
/// continuously rather than in discrete fixed windows so a client that
/// waits briefly after bursting isn't penalized for the whole minute.
pub struct IpRateLimiter {
    limit_per_min: u32,
    buckets: Mutex<HashMap<IpAddr, Bucket>>,
}

impl IpRateLimiter {
    pub fn new(limit_per_min: u32) -> Self {
        Self {
            limit_per_min,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn check(&self, ip: IpAddr) -> bool {
        let capacity = self.limit_per_min as f64;
        let refill_per_sec = capacity / 60.0;
        let mut buckets = self.buckets.lock().unwrap();
        buckets
            .entry(ip)
            .or_insert_with(|| Bucket::new(capacity, refill_per_sec))
            .try_consume()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_limit_then_rejects() {
        let limiter = IpRateLimiter::new(2);
        let ip: IpAddr = "127.0.0.1".parse().unwrap();
        assert!(limiter.check(ip));
        assert!(limiter.check(ip));
        assert!(!limiter.check(ip));
    }

    #[test]
    fn tracks_distinct_ips_independently() {
        let limiter = IpRateLimiter::new(1);
        let a: IpAddr = "127.0.0.1".parse().unwrap();
        let b: IpAddr = "127.0.0.2".parse().unwrap();
        assert!(limiter.check(a));
        assert!(limiter.check(b));
        assert!(!limiter.check(a));
    }

    #[test]
    fn refills_over_time() {
        let limiter = IpRateLimiter::new(600);
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        assert!(limiter.check(ip));
        std::thread::sleep(Duration::from_millis(20));
        assert!(limiter.check(ip));
    }
}
