use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::config::StripeConfig;

pub const PRODUCT_NAME: &str = "Premium Roast (1 credit)";
pub const UNIT_AMOUNT_CENTS: u32 = 199;
pub const CURRENCY: &str = "eur";

#[async_trait]
pub trait CheckoutGateway {
    /// Creates a hosted checkout page for one premium roast and returns its URL.
    async fn create_session(&self, cancel_url: &str) -> Result<String>;

    /// Looks up the session's payment status. Unknown sessions are unpaid.
    async fn is_paid(&self, session_id: &str) -> Result<bool>;
}

#[derive(Debug, Deserialize)]
struct StripeCheckoutSession {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    payment_status: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

/// Stripe ids are `cs_test_...` / `cs_live_...`; anything else never reaches the URL path.
pub fn is_valid_session_id(session_id: &str) -> bool {
    !session_id.is_empty()
        && session_id.len() <= 255
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub struct StripeCheckoutService {
    client: Client,
    secret_key: String,
    success_url: String,
    api_base: String,
}

impl StripeCheckoutService {
    pub fn new(secret_key: String, success_url: String, api_base: String) -> Self {
        Self {
            client: Client::new(),
            secret_key,
            success_url,
            api_base,
        }
    }

    /// None when no Stripe secret is configured.
    pub fn from_config(config: &StripeConfig) -> Option<Self> {
        config.secret_key.clone().map(|secret_key| {
            Self::new(
                secret_key,
                config.success_url.clone(),
                config.api_base.clone(),
            )
        })
    }

    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<StripeErrorBody>(&body)
            .ok()
            .and_then(|parsed| parsed.error.message)
            .unwrap_or(body);
        format!("Stripe returned {}: {}", status, message)
    }
}

#[async_trait]
impl CheckoutGateway for StripeCheckoutService {
    async fn create_session(&self, cancel_url: &str) -> Result<String> {
        let unit_amount = UNIT_AMOUNT_CENTS.to_string();

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[
                ("mode", "payment"),
                ("payment_method_types[0]", "card"),
                ("line_items[0][price_data][currency]", CURRENCY),
                ("line_items[0][price_data][product_data][name]", PRODUCT_NAME),
                ("line_items[0][price_data][unit_amount]", unit_amount.as_str()),
                ("line_items[0][quantity]", "1"),
                ("success_url", self.success_url.as_str()),
                ("cancel_url", cancel_url),
            ])
            .send()
            .await
            .context("Failed to send checkout session request to Stripe")?;

        if !response.status().is_success() {
            return Err(anyhow!(Self::error_message(response).await));
        }

        let session: StripeCheckoutSession = response
            .json()
            .await
            .context("Failed to parse Stripe checkout session")?;

        tracing::info!("Created checkout session {}", session.id);
        session
            .url
            .ok_or_else(|| anyhow!("Stripe checkout session {} has no url", session.id))
    }

    async fn is_paid(&self, session_id: &str) -> Result<bool> {
        if !is_valid_session_id(session_id) {
            tracing::info!("Rejected malformed checkout session id");
            return Ok(false);
        }

        let response = self
            .client
            .get(format!(
                "{}/v1/checkout/sessions/{}",
                self.api_base, session_id
            ))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await
            .context("Failed to send checkout session lookup to Stripe")?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::info!("Checkout session {} not found", session_id);
            return Ok(false);
        }
        if !response.status().is_success() {
            return Err(anyhow!(Self::error_message(response).await));
        }

        let session: StripeCheckoutSession = response
            .json()
            .await
            .context("Failed to parse Stripe checkout session")?;

        Ok(session.payment_status == "paid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_shape() {
        assert!(is_valid_session_id("cs_test_a1B2c3"));
        assert!(!is_valid_session_id(""));
        assert!(!is_valid_session_id("../../v1/customers"));
        assert!(!is_valid_session_id("cs_test?expand=x"));
    }

    #[test]
    fn parses_stripe_session_payloads() {
        let session: StripeCheckoutSession = serde_json::from_str(
            r#"{"id":"cs_test_1","object":"checkout.session","url":"https://checkout.stripe.com/c/pay/cs_test_1","payment_status":"unpaid"}"#,
        )
        .unwrap();
        assert_eq!(session.id, "cs_test_1");
        assert_eq!(
            session.url.as_deref(),
            Some("https://checkout.stripe.com/c/pay/cs_test_1")
        );
        assert_eq!(session.payment_status, "unpaid");

        let session: StripeCheckoutSession =
            serde_json::from_str(r#"{"id":"cs_test_2","url":null,"payment_status":"paid"}"#)
                .unwrap();
        assert_eq!(session.url, None);
        assert_eq!(session.payment_status, "paid");
    }

    #[test]
    fn from_config_requires_secret() {
        let mut config = crate::config::AppConfig::default().stripe;
        assert!(StripeCheckoutService::from_config(&config).is_none());

        config.secret_key = Some("sk_test_123".to_string());
        assert!(StripeCheckoutService::from_config(&config).is_some());
    }
}
