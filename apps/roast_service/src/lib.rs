pub mod app_module;
pub mod app_router;
pub mod checkout;
pub mod config;
pub mod content_filter;
pub mod error;
pub mod prompts;
pub mod rate_limit;
pub mod roast;
