//! HTTP middleware components
//!
//! Session extraction, sign-in rate limiting and request correlation.

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::CurrentSession;
pub use rate_limit::{RateLimiter, RateLimiterConfig, RateLimiterLayer, RateLimiterState};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id};
