//! Rate limiting infrastructure

mod token_bucket;

pub use token_bucket::{
    RateLimitConfig, RateLimitDecision, TokenBucket, DEFAULT_BURST, DEFAULT_REFILL_PER_SECOND,
};
