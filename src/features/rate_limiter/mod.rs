pub mod state;

pub use state::{InMemoryRateLimitState, RateLimitDecision, RateLimitState};
