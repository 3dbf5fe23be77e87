//! Token bucket rate limiter
//!
//! One bucket shared by every request in the process. Tokens refill continuously at a
//! fixed rate up to the burst size; each admitted request consumes one token.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Tokens added per second by default
pub const DEFAULT_REFILL_PER_SECOND: f64 = 0.167;
/// Bucket capacity by default
pub const DEFAULT_BURST: u32 = 10;

/// Token bucket parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub refill_per_second: f64,
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            refill_per_second: DEFAULT_REFILL_PER_SECOND,
            burst: DEFAULT_BURST,
        }
    }
}

impl RateLimitConfig {
    pub fn new(refill_per_second: f64, burst: u32) -> Self {
        Self {
            enabled: true,
            refill_per_second,
            burst,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

/// Result of a rate limit check
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitDecision {
    /// Whether the request is allowed
    pub allowed: bool,
    /// Whole tokens left after this decision
    pub remaining: u32,
    /// Time until the next token, set only for rejections
    pub retry_after: Option<Duration>,
}

impl RateLimitDecision {
    /// Seconds until the next token, rounded up
    pub fn retry_after_secs(&self) -> Option<u64> {
        self.retry_after
            .map(|wait| wait.as_secs() + u64::from(wait.subsec_nanos() > 0))
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Thread-safe token bucket
///
/// The state sits behind a plain mutex that is never held across an await point.
#[derive(Debug)]
pub struct TokenBucket {
    config: RateLimitConfig,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Creates a full bucket
    pub fn new(config: RateLimitConfig) -> Self {
        let tokens = f64::from(config.burst);
        Self {
            config,
            state: Mutex::new(BucketState {
                tokens,
                last_refill: Instant::now(),
            }),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Consumes one token if available
    pub fn allow(&self) -> bool {
        self.check().allowed
    }

    /// Consumes one token if available and reports the bucket state
    pub fn check(&self) -> RateLimitDecision {
        self.check_at(Instant::now())
    }

    /// Same as `check` with an explicit clock reading
    pub fn check_at(&self, now: Instant) -> RateLimitDecision {
        if !self.config.enabled {
            return RateLimitDecision {
                allowed: true,
                remaining: self.config.burst,
                retry_after: None,
            };
        }

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let elapsed = now.saturating_duration_since(state.last_refill);
        state.tokens = (state.tokens + elapsed.as_secs_f64() * self.config.refill_per_second)
            .min(f64::from(self.config.burst));
        state.last_refill = state.last_refill.max(now);

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            return RateLimitDecision {
                allowed: true,
                remaining: state.tokens.floor() as u32,
                retry_after: None,
            };
        }

        let retry_after = if self.config.refill_per_second > 0.0 {
            Duration::try_from_secs_f64((1.0 - state.tokens) / self.config.refill_per_second)
                .unwrap_or(Duration::MAX)
        } else {
            Duration::MAX
        };

        RateLimitDecision {
            allowed: false,
            remaining: 0,
            retry_after: Some(retry_after),
        }
    }
}

impl Default for TokenBucket {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_of_one_then_rejected() {
        let bucket = TokenBucket::new(RateLimitConfig::new(0.001, 1));

        assert!(bucket.allow());
        assert!(!bucket.allow());
    }

    #[test]
    fn test_default_burst_drains_after_ten() {
        let bucket = TokenBucket::default();
        let now = Instant::now();

        for expected_remaining in (0..10).rev() {
            let decision = bucket.check_at(now);
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }

        let rejected = bucket.check_at(now);
        assert!(!rejected.allowed);
        assert_eq!(rejected.retry_after_secs(), Some(6));
    }

    #[test]
    fn test_refill_over_time() {
        let bucket = TokenBucket::new(RateLimitConfig::new(1.0, 2));
        let start = Instant::now();

        assert!(bucket.check_at(start).allowed);
        assert!(bucket.check_at(start).allowed);
        assert!(!bucket.check_at(start).allowed);

        assert!(bucket.check_at(start + Duration::from_secs(1)).allowed);
        assert!(!bucket.check_at(start + Duration::from_secs(1)).allowed);
    }

    #[test]
    fn test_refill_is_capped_at_burst() {
        let bucket = TokenBucket::new(RateLimitConfig::new(10.0, 3));
        let later = Instant::now() + Duration::from_secs(60);

        let decision = bucket.check_at(later);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 2);
    }

    #[test]
    fn test_retry_after_rounds_up() {
        let bucket = TokenBucket::new(RateLimitConfig::new(0.4, 1));
        let now = Instant::now();

        assert!(bucket.check_at(now).allowed);
        let rejected = bucket.check_at(now);

        assert_eq!(rejected.retry_after_secs(), Some(3));
    }

    #[test]
    fn test_disabled_always_allows() {
        let bucket = TokenBucket::new(RateLimitConfig {
            burst: 1,
            ..RateLimitConfig::disabled()
        });

        for _ in 0..5 {
            assert!(bucket.allow());
        }
    }

    #[test]
    fn test_shared_across_threads() {
        let bucket = std::sync::Arc::new(TokenBucket::new(RateLimitConfig::new(0.0, 5)));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let bucket = std::sync::Arc::clone(&bucket);
                std::thread::spawn(move || bucket.allow())
            })
            .collect();

        let allowed = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|allowed| *allowed)
            .count();
        assert_eq!(allowed, 5);
    }
}
