pub mod rate_limit_middleware;
pub mod rate_limiter;
