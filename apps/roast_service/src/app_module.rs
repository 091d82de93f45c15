use std::sync::Arc;

use crate::{
    checkout::checkout_service::{CheckoutGateway, StripeCheckoutService},
    config::AppConfig,
    rate_limit::rate_limiter::RateLimiter,
    roast::roast_service::RoastService,
};

#[derive(Clone)]
pub struct AppService {
    pub roast_service: RoastService,
    /// None when payments are not configured.
    pub checkout_service: Option<Arc<dyn CheckoutGateway + Send + Sync>>,
}

impl AppService {
    pub fn new(config: &AppConfig) -> Self {
        let roast_service = RoastService::from_config(&config.openai);
        let checkout_service = StripeCheckoutService::from_config(&config.stripe)
            .map(|service| Arc::new(service) as Arc<dyn CheckoutGateway + Send + Sync>);

        Self {
            roast_service,
            checkout_service,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub service: AppService,
    pub config: Arc<AppConfig>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let service = AppService::new(&config);
        Self::with_service(config, service)
    }

    pub fn with_service(config: AppConfig, service: AppService) -> Self {
        Self {
            service,
            config: Arc::new(config),
            rate_limiter: Arc::new(RateLimiter::default()),
        }
    }
}
