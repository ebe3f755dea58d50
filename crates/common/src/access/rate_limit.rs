use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use uuid::Uuid;

/// Tuning for the login rate limiter.
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Attempts allowed within one window.
    pub max_attempts: u32,
    /// How long a counter lives after its first hit.
    pub window: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::from_secs(60),
        }
    }
}

/// The throttle key for password attempts: one counter per share per
/// client address.
pub fn login_throttle_key(share_id: Uuid, client_ip: &str) -> String {
    format!("{}|{}", share_id, client_ip)
}

#[derive(Debug, Clone, Copy)]
struct Counter {
    attempts: u32,
    window_start: Instant,
}

impl Counter {
    fn expired(&self, now: Instant, window: Duration) -> bool {
        now.duration_since(self.window_start) >= window
    }
}

/// Fixed-window attempt counters over opaque string keys.
///
/// A counter starts at the first hit and expires a full window later,
/// whatever happens in between. Counters are serialized behind one lock;
/// concurrent hits never undercount.
#[derive(Debug)]
pub struct LoginRateLimiter {
    config: ThrottleConfig,
    counters: Mutex<HashMap<String, Counter>>,
}

impl LoginRateLimiter {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            counters: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    /// Whether the key has exhausted its attempts for the current window.
    /// Checking does not consume an attempt.
    pub fn too_many_attempts(&self, key: &str) -> bool {
        self.too_many_attempts_at(key, Instant::now())
    }

    pub(crate) fn too_many_attempts_at(&self, key: &str, now: Instant) -> bool {
        let mut counters = self.counters.lock();
        match counters.get(key) {
            Some(counter) if !counter.expired(now, self.config.window) => {
                counter.attempts >= self.config.max_attempts
            }
            Some(_) => {
                counters.remove(key);
                false
            }
            None => false,
        }
    }

    /// Record a failed attempt, returning the count for this window.
    pub fn hit(&self, key: &str) -> u32 {
        self.hit_at(key, Instant::now())
    }

    pub(crate) fn hit_at(&self, key: &str, now: Instant) -> u32 {
        let mut counters = self.counters.lock();
        match counters.get_mut(key) {
            Some(counter) if !counter.expired(now, self.config.window) => {
                counter.attempts += 1;
                counter.attempts
            }
            _ => {
                counters.insert(
                    key.to_string(),
                    Counter {
                        attempts: 1,
                        window_start: now,
                    },
                );
                1
            }
        }
    }

    /// Time until the key's window expires. Zero when the key is unknown
    /// or already expired.
    pub fn available_in(&self, key: &str) -> Duration {
        self.available_in_at(key, Instant::now())
    }

    pub(crate) fn available_in_at(&self, key: &str, now: Instant) -> Duration {
        let counters = self.counters.lock();
        match counters.get(key) {
            Some(counter) => {
                (counter.window_start + self.config.window).saturating_duration_since(now)
            }
            None => Duration::ZERO,
        }
    }

    /// Drop the counter for a key.
    pub fn clear(&self, key: &str) {
        self.counters.lock().remove(key);
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new(ThrottleConfig::default())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_under_limit_is_not_throttled() {
        let limiter = LoginRateLimiter::default();
        let key = "share|10.0.0.1";
        for _ in 0..4 {
            limiter.hit(key);
        }
        assert!(!limiter.too_many_attempts(key));
    }

    #[test]
    fn test_limit_reached_blocks_further_attempts() {
        let limiter = LoginRateLimiter::default();
        let key = "share|10.0.0.1";
        for n in 1..=5 {
            assert_eq!(limiter.hit(key), n);
        }
        assert!(limiter.too_many_attempts(key));
    }

    #[test]
    fn test_checking_does_not_consume_attempts() {
        let limiter = LoginRateLimiter::default();
        let key = "share|10.0.0.1";
        limiter.hit(key);
        for _ in 0..100 {
            assert!(!limiter.too_many_attempts(key));
        }
    }

    #[test]
    fn test_window_expiry_resets_counter() {
        let limiter = LoginRateLimiter::new(ThrottleConfig {
            max_attempts: 2,
            window: Duration::from_secs(60),
        });
        let key = "share|10.0.0.1";
        let start = Instant::now();

        limiter.hit_at(key, start);
        limiter.hit_at(key, start + Duration::from_secs(10));
        assert!(limiter.too_many_attempts_at(key, start + Duration::from_secs(30)));

        // the window is anchored at the first hit
        let after = start + Duration::from_secs(61);
        assert!(!limiter.too_many_attempts_at(key, after));
        assert_eq!(limiter.hit_at(key, after), 1);
    }

    #[test]
    fn test_available_in_counts_down() {
        let limiter = LoginRateLimiter::default();
        let key = "share|10.0.0.1";
        let start = Instant::now();

        assert_eq!(limiter.available_in_at(key, start), Duration::ZERO);

        limiter.hit_at(key, start);
        assert_eq!(
            limiter.available_in_at(key, start + Duration::from_secs(15)),
            Duration::from_secs(45)
        );
        assert_eq!(
            limiter.available_in_at(key, start + Duration::from_secs(90)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = LoginRateLimiter::new(ThrottleConfig {
            max_attempts: 1,
            window: Duration::from_secs(60),
        });
        let share = Uuid::new_v4();
        let a = login_throttle_key(share, "10.0.0.1");
        let b = login_throttle_key(share, "10.0.0.2");

        limiter.hit(&a);
        assert!(limiter.too_many_attempts(&a));
        assert!(!limiter.too_many_attempts(&b));
    }

    #[test]
    fn test_clear_resets_key() {
        let limiter = LoginRateLimiter::new(ThrottleConfig {
            max_attempts: 1,
            window: Duration::from_secs(60),
        });
        let key = "share|10.0.0.1";
        limiter.hit(key);
        assert!(limiter.too_many_attempts(key));
        limiter.clear(key);
        assert!(!limiter.too_many_attempts(key));
    }

    #[test]
    fn test_throttle_key_format() {
        let share = Uuid::new_v4();
        assert_eq!(
            login_throttle_key(share, "192.168.0.9"),
            format!("{}|192.168.0.9", share)
        );
    }
}
