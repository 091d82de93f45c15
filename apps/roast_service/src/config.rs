use std::{env, path::PathBuf, str::FromStr, time::Duration};

use roast_llm::{LLMClientConfig, RetryConfig};
use thiserror::Error;

pub const CHECKOUT_SESSION_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{key} is not a valid {expected}: {value:?}")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("STRIPE_SUCCESS_URL must contain the {{CHECKOUT_SESSION_ID}} placeholder")]
    MissingSessionPlaceholder,

    #[error(
        "REQUEST_TIMEOUT_SECS ({request:?}) must exceed the worst-case generation time ({generation:?}) from OPENAI_TIMEOUT_SECS and OPENAI_MAX_RETRIES"
    )]
    TimeoutBudget {
        request: Duration,
        generation: Duration,
    },
}

#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Unset means roasts come from the offline fallback list.
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl OpenAIConfig {
    pub fn client_config(&self) -> LLMClientConfig {
        LLMClientConfig {
            timeout: self.timeout,
            retry_config: RetryConfig {
                max_retries: self.max_retries,
                ..RetryConfig::default()
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Unset disables checkout creation and verification.
    pub secret_key: Option<String>,
    pub success_url: String,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: PathBuf,
    pub request_timeout: Duration,
    pub environment: String,
    /// Key rate limiting on the leftmost X-Forwarded-For entry instead of the
    /// peer address. Only safe behind a proxy that overwrites the header.
    pub trust_proxy: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai: OpenAIConfig,
    pub stripe: StripeConfig,
    pub server: ServerConfig,
    /// Serve premium roasts without payment when Stripe is not configured.
    pub premium_demo_mode: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai: OpenAIConfig {
                api_key: None,
                model: "gpt-4o-mini".to_string(),
                timeout: Duration::from_secs(20),
                max_retries: 0,
            },
            stripe: StripeConfig {
                secret_key: None,
                success_url: format!("/success?session_id={}", CHECKOUT_SESSION_PLACEHOLDER),
                api_base: "https://api.stripe.com".to_string(),
            },
            server: ServerConfig {
                port: 3000,
                static_dir: PathBuf::from("public"),
                request_timeout: Duration::from_secs(30),
                environment: "dev".to_string(),
                trust_proxy: false,
            },
            premium_demo_mode: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from a variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let success_url = get("STRIPE_SUCCESS_URL").unwrap_or(defaults.stripe.success_url);
        if !success_url.contains(CHECKOUT_SESSION_PLACEHOLDER) {
            return Err(ConfigError::MissingSessionPlaceholder);
        }

        let config = Self {
            openai: OpenAIConfig {
                api_key: get("OPENAI_API_KEY"),
                model: get("OPENAI_MODEL").unwrap_or(defaults.openai.model),
                timeout: parse_or(&get, "OPENAI_TIMEOUT_SECS", 20).map(Duration::from_secs)?,
                max_retries: parse_or(&get, "OPENAI_MAX_RETRIES", 0)?,
            },
            stripe: StripeConfig {
                secret_key: get("STRIPE_SECRET_KEY"),
                success_url,
                api_base: get("STRIPE_API_BASE")
                    .map(|base| base.trim_end_matches('/').to_string())
                    .unwrap_or(defaults.stripe.api_base),
            },
            server: ServerConfig {
                port: parse_or(&get, "PORT", 3000)?,
                static_dir: get("STATIC_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.server.static_dir),
                request_timeout: parse_or(&get, "REQUEST_TIMEOUT_SECS", 30)
                    .map(Duration::from_secs)?,
                environment: get("APP_ENVIRONMENT").unwrap_or(defaults.server.environment),
                trust_proxy: parse_flag(&get, "TRUST_PROXY")?,
            },
            premium_demo_mode: parse_flag(&get, "PREMIUM_DEMO_MODE")?,
        };

        // The generation error has to reach the client before the request
        // timeout turns it into a 408.
        let generation = config.openai.client_config().worst_case_duration();
        if config.server.request_timeout <= generation {
            return Err(ConfigError::TimeoutBudget {
                request: config.server.request_timeout,
                generation,
            });
        }

        Ok(config)
    }

    pub fn payments_enabled(&self) -> bool {
        self.stripe.secret_key.is_some()
    }

    pub fn is_dev(&self) -> bool {
        self.server.environment == "dev"
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
            key,
            expected: "number",
            value: raw,
        }),
        None => Ok(default),
    }
}

fn parse_flag<G>(get: &G, key: &'static str) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(false),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                key,
                expected: "boolean",
                value: raw,
            }),
        },
    }
}
